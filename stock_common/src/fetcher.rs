//! Quote fetcher: symbol search, cached single quotes and batch quotes.
//!
//! The fetcher is the only place where provider payloads are interpreted. It
//! turns the provider's loosely-typed JSON into `SymbolRecord` and `Quote`
//! values and applies the failure policy:
//!
//! - `search_symbols` propagates provider and transport failures.
//! - `get_quote` never fails; it falls back to the last cached value, then to
//!   an error-flagged quote.
//! - `get_batch_quotes` fails only on invalid input or a failed HTTP call;
//!   per-symbol problems become error-flagged quotes.
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::cache::{DEFAULT_TTL, QuoteCache};
use crate::error::StockError;
use crate::model::lenient::{optional_f64, string_or_empty};
use crate::model::{Quote, SymbolRecord};
use crate::provider::QuoteProvider;
use crate::result::Result;

/// Queries shorter than this return no results without a network call.
pub const MIN_QUERY_LEN: usize = 2;

/// Symbol searched when probing whether a credential works.
const PROBE_SYMBOL: &str = "AAPL";

const MISSING_KEY: &str = "API key is required";
const SYMBOL_ERROR: &str = "Error fetching data";
const INVALID_RESPONSE: &str = "Invalid response from Twelve Data";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSymbol {
    #[serde(default, deserialize_with = "string_or_empty")]
    symbol: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    instrument_name: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    exchange: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    instrument_type: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    currency: String,
}

impl From<RawSymbol> for SymbolRecord {
    fn from(raw: RawSymbol) -> Self {
        SymbolRecord {
            symbol: raw.symbol,
            name: raw.instrument_name,
            exchange: raw.exchange,
            instrument_type: raw.instrument_type,
            currency: raw.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default, deserialize_with = "optional_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "optional_f64")]
    close: Option<f64>,
    #[serde(default, deserialize_with = "optional_f64")]
    change: Option<f64>,
    #[serde(default, deserialize_with = "optional_f64")]
    percent_change: Option<f64>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl RawQuote {
    /// Populated quote for `symbol`, or `None` without a usable price.
    fn into_quote(self, symbol: &str) -> Option<Quote> {
        let price = self.price.or(self.close)?;
        let timestamp = self
            .timestamp
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);
        Some(Quote {
            symbol: symbol.to_string(),
            name: self.name,
            exchange: self.exchange,
            price,
            change: self.change.unwrap_or(0.0),
            percent_change: self.percent_change.unwrap_or(0.0),
            timestamp,
            error: false,
            message: None,
        })
    }

    fn is_error(&self) -> bool {
        self.code.as_ref().is_some_and(|code| !code.is_null())
    }
}

/// Symbol search and quote retrieval over a `QuoteProvider`, with a TTL cache.
pub struct QuoteFetcher {
    provider: Box<dyn QuoteProvider>,
    cache: QuoteCache,
    min_query_len: usize,
}

impl QuoteFetcher {
    /// Fetcher with the default five minute TTL and minimum query length.
    pub fn new(provider: impl QuoteProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            cache: QuoteCache::new(DEFAULT_TTL),
            min_query_len: MIN_QUERY_LEN,
        }
    }

    /// Replace the cache with one expiring after `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = QuoteCache::new(ttl);
        self
    }

    /// Change the minimum query length below which searches are skipped.
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    /// The owned quote cache.
    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// Search the provider for symbols matching `query`.
    ///
    /// Empty or too short queries return an empty list without a network call.
    pub fn search_symbols(&self, query: &str, api_key: &str) -> Result<Vec<SymbolRecord>> {
        let query = query.trim();
        if query.is_empty() || query.chars().count() < self.min_query_len {
            return Ok(Vec::new());
        }
        self.search(query, api_key)
    }

    /// Record whose symbol equals `symbol`, ignoring ASCII case.
    ///
    /// Unlike [`search_symbols`](Self::search_symbols) there is no minimum
    /// length, so one-letter tickers such as `F` resolve.
    pub fn lookup_symbol(&self, symbol: &str, api_key: &str) -> Result<Option<SymbolRecord>> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Ok(None);
        }
        Ok(self
            .search(symbol, api_key)?
            .into_iter()
            .find(|record| record.symbol.eq_ignore_ascii_case(symbol)))
    }

    fn search(&self, query: &str, api_key: &str) -> Result<Vec<SymbolRecord>> {
        if api_key.trim().is_empty() {
            return Err(StockError::InvalidCredential(MISSING_KEY.to_string()));
        }

        let payload = self
            .provider
            .symbol_search(query, api_key)
            .inspect_err(|e| error!("Error searching symbols for {:?}: {}", query, e))?;
        let response: SearchResponse = serde_json::from_value(payload)?;

        if let Some(Value::Array(items)) = response.data {
            let records: Vec<SymbolRecord> = items
                .iter()
                .filter_map(|item| RawSymbol::deserialize(item).ok())
                .map(SymbolRecord::from)
                .collect();
            debug!("Search {:?} returned {} symbols", query, records.len());
            self.cache.store_search(records.clone());
            return Ok(records);
        }

        if let Some(message) = response.message {
            error!("Symbol search rejected: {}", message);
            return Err(StockError::InvalidCredential(message));
        }

        Ok(Vec::new())
    }

    /// Quote for `symbol`. Never fails.
    ///
    /// Served from the cache while the cached value is younger than the TTL.
    /// When a fetch fails the last cached value is returned, whatever its age;
    /// without one the result is an error-flagged quote carrying the message.
    pub fn get_quote(&self, symbol: &str, api_key: &str) -> Quote {
        if let Some(quote) = self.cache.fresh(symbol) {
            debug!("Quote for {} served from cache", symbol);
            return quote;
        }

        match self.fetch_quote(symbol, api_key) {
            Ok(quote) => {
                self.cache.insert(symbol, quote.clone());
                quote
            }
            Err(e) => {
                error!("Error fetching quote for {}: {}", symbol, e);
                match self.cache.last_known(symbol) {
                    Some(stale) => {
                        warn!("Serving stale quote for {}", symbol);
                        stale
                    }
                    None => Quote::failed(symbol, e.to_string()),
                }
            }
        }
    }

    fn fetch_quote(&self, symbol: &str, api_key: &str) -> Result<Quote> {
        if api_key.trim().is_empty() {
            return Err(StockError::InvalidCredential(MISSING_KEY.to_string()));
        }

        let payload = self.provider.quote(&[symbol.to_string()], api_key)?;
        let raw = RawQuote::deserialize(&payload)?;
        if raw.is_error() || raw.price.or(raw.close).is_none() {
            return Err(match raw.message {
                Some(message) => StockError::InvalidCredential(message),
                None => StockError::UpstreamUnavailable(INVALID_RESPONSE.to_string()),
            });
        }
        raw.into_quote(symbol)
            .ok_or_else(|| StockError::UpstreamUnavailable(INVALID_RESPONSE.to_string()))
    }

    /// Quotes for several symbols in one provider call, in input order.
    ///
    /// A symbol whose payload is missing or carries an error code yields an
    /// error-flagged quote; the others are still returned.
    pub fn get_batch_quotes(&self, symbols: &[String], api_key: &str) -> Result<Vec<Quote>> {
        if symbols.is_empty() || api_key.trim().is_empty() {
            return Err(StockError::Validation(
                "Symbols array and API key are required".to_string(),
            ));
        }

        let payload = self
            .provider
            .quote(symbols, api_key)
            .inspect_err(|e| error!("Error fetching batch quotes: {}", e))?;

        // A single symbol comes back as the quote object itself, several as
        // an object keyed by symbol.
        let quotes: Vec<Quote> = if let [symbol] = symbols {
            vec![batch_entry(symbol, Some(&payload))]
        } else {
            symbols
                .iter()
                .map(|symbol| batch_entry(symbol, payload.get(symbol.as_str())))
                .collect()
        };

        let failed = quotes.iter().filter(|quote| quote.is_error()).count();
        if failed > 0 {
            warn!(
                "{}",
                StockError::PartialBatchFailure {
                    failed,
                    total: quotes.len()
                }
            );
        }
        Ok(quotes)
    }

    /// Reset cached quotes and the remembered search.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Probe search with `api_key`; valid when it yields at least one symbol.
    pub fn validate_credential(&self, api_key: &str) -> bool {
        match self.search_symbols(PROBE_SYMBOL, api_key) {
            Ok(records) => !records.is_empty(),
            Err(e) => {
                warn!("API key validation failed: {}", e);
                false
            }
        }
    }
}

/// Normalize one symbol's slice of a batch payload.
fn batch_entry(symbol: &str, payload: Option<&Value>) -> Quote {
    let Some(payload) = payload.filter(|value| value.is_object()) else {
        return Quote::failed(symbol, SYMBOL_ERROR);
    };
    match RawQuote::deserialize(payload) {
        Ok(raw) if raw.is_error() => {
            Quote::failed(symbol, raw.message.unwrap_or_else(|| SYMBOL_ERROR.to_string()))
        }
        Ok(raw) => raw
            .into_quote(symbol)
            .unwrap_or_else(|| Quote::failed(symbol, INVALID_RESPONSE)),
        Err(e) => Quote::failed(symbol, e.to_string()),
    }
}
