//! Time-based quote cache.
//!
//! Entries live for a fixed TTL (five minutes by default) measured with the
//! monotonic `Instant`. There is no size bound and no LRU: the key space is a
//! single user's watch-list. Expired entries are kept around as the fallback
//! for failed fetches until `clear` or a fresh value replaces them.
//!
//! The cache is owned by the fetcher and synchronized internally, so a single
//! instance can be shared across request handlers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::model::{Quote, SymbolRecord};

/// Default expiration window of a cached quote.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    quotes: HashMap<String, CacheEntry>,
    symbols: Option<Vec<SymbolRecord>>,
}

/// Quote cache with a fixed time-to-live.
pub struct QuoteCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QuoteCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Expiration window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A poisoned lock still holds usable entries.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Quote for `symbol` if it was fetched less than one TTL ago.
    pub fn fresh(&self, symbol: &str) -> Option<Quote> {
        let now = Instant::now();
        self.lock()
            .quotes
            .get(symbol)
            .filter(|entry| now.duration_since(entry.fetched_at) < self.ttl)
            .map(|entry| entry.quote.clone())
    }

    /// Last quote stored for `symbol`, regardless of age.
    pub fn last_known(&self, symbol: &str) -> Option<Quote> {
        self.lock()
            .quotes
            .get(symbol)
            .map(|entry| entry.quote.clone())
    }

    /// Store a freshly fetched quote.
    pub fn insert(&self, symbol: &str, quote: Quote) {
        self.lock().quotes.insert(
            symbol.to_string(),
            CacheEntry {
                quote,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Remember the latest search result list.
    pub fn store_search(&self, records: Vec<SymbolRecord>) {
        self.lock().symbols = Some(records);
    }

    /// Latest search result list, if any search succeeded since the last clear.
    pub fn last_search(&self) -> Option<Vec<SymbolRecord>> {
        self.lock().symbols.clone()
    }

    /// Number of cached quotes, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().quotes.len()
    }

    /// `true` when no quote is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached quote and the remembered search.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.quotes.clear();
        state.symbols = None;
    }
}
