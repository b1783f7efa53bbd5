//! One refresh of the watch-list: batch fetch, merge, persist, export.
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use stock_common::{QuoteFetcher, Result, Watchlist};

use crate::export::Exporter;
use crate::store::WatchlistStore;

/// Outcome of one cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshReport {
    /// Entries that received new values.
    pub updated: usize,
    /// Symbols whose quote came back error-flagged.
    pub failed: usize,
    /// Where the document was exported, when an exporter is configured.
    pub exported: Option<String>,
}

/// Everything a refresh needs, shared between manual and scheduled runs.
///
/// The store is the source of truth; `watchlist` holds the list as of the
/// last cycle.
pub struct RefreshCycle {
    fetcher: Arc<QuoteFetcher>,
    watchlist: Arc<Mutex<Watchlist>>,
    store: WatchlistStore,
    exporter: Option<Box<dyn Exporter>>,
    api_key: Option<String>,
}

impl RefreshCycle {
    /// Cycle over the list persisted in `store`, mirrored into `watchlist`, without export.
    pub fn new(
        fetcher: Arc<QuoteFetcher>,
        watchlist: Arc<Mutex<Watchlist>>,
        store: WatchlistStore,
        api_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            watchlist,
            store,
            exporter: None,
            api_key,
        }
    }

    /// Export the merged list through `exporter` at the end of every cycle.
    pub fn with_exporter(mut self, exporter: Box<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Run the cycle. An empty watch-list or a missing key does nothing.
    ///
    /// The list is re-read from the store before fetching and again before
    /// merging, so entries added or removed by another process in between are
    /// kept. The lock is not held while quotes are fetched.
    pub fn run(&self) -> Result<RefreshReport> {
        let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) else {
            debug!("No API key, skipping refresh");
            return Ok(RefreshReport::default());
        };
        let symbols = {
            let mut list = self.watchlist.lock()?;
            *list = self.store.load();
            list.symbols()
        };
        if symbols.is_empty() {
            debug!("Watch-list is empty, skipping refresh");
            return Ok(RefreshReport::default());
        }

        let quotes = self.fetcher.get_batch_quotes(&symbols, api_key)?;
        let failed = quotes.iter().filter(|quote| quote.is_error()).count();
        for quote in quotes.iter().filter(|quote| quote.is_error()) {
            warn!(
                "No quote for {}: {}",
                quote.symbol,
                quote.message.as_deref().unwrap_or("unknown error")
            );
        }

        let (updated, list) = {
            let mut list = self.watchlist.lock()?;
            *list = self.store.load();
            let updated = list.merge_quotes(&quotes);
            self.store.save(&list);
            (updated, list.clone())
        };

        let exported = match &self.exporter {
            Some(exporter) => Some(exporter.export(list.entries())?),
            None => None,
        };

        info!(
            "Refreshed {} of {} stocks ({} failed)",
            updated,
            symbols.len(),
            failed
        );
        Ok(RefreshReport {
            updated,
            failed,
            exported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::FileExporter;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stock_common::provider::QuoteProvider;
    use stock_common::{StockError, SymbolRecord, XmlFormat};

    struct KeyedProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl QuoteProvider for KeyedProvider {
        fn symbol_search(&self, _query: &str, _api_key: &str) -> Result<Value> {
            Ok(json!({"data": []}))
        }

        fn quote(&self, symbols: &[String], _api_key: &str) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StockError::UpstreamUnavailable("offline".into()));
            }
            let mut map = serde_json::Map::new();
            for symbol in symbols {
                let quote = if symbol == "BAD" {
                    json!({"code": 404, "message": "symbol not found"})
                } else {
                    json!({"symbol": symbol, "close": "101.5", "change": "1.5", "percent_change": "1.5"})
                };
                map.insert(symbol.clone(), quote);
            }
            Ok(Value::Object(map))
        }
    }

    fn list_of(symbols: &[&str]) -> Watchlist {
        let mut list = Watchlist::new();
        for symbol in symbols {
            list.add(SymbolRecord::new(symbol, "Company"));
        }
        list
    }

    /// Saves `symbols` into `store` and builds a cycle over it.
    fn setup(
        store: &WatchlistStore,
        fail: bool,
        symbols: &[&str],
        api_key: Option<&str>,
    ) -> (Arc<KeyedProvider>, RefreshCycle, Arc<Mutex<Watchlist>>) {
        let provider = Arc::new(KeyedProvider {
            calls: AtomicUsize::new(0),
            fail,
        });
        let fetcher = Arc::new(QuoteFetcher::new(Arc::clone(&provider)));
        if !symbols.is_empty() {
            store.save(&list_of(symbols));
        }
        let watchlist = Arc::new(Mutex::new(store.load()));
        let cycle = RefreshCycle::new(
            fetcher,
            Arc::clone(&watchlist),
            store.clone(),
            api_key.map(String::from),
        );
        (provider, cycle, watchlist)
    }

    #[test]
    fn cycle_merges_persists_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("data"));
        let (_, cycle, watchlist) = setup(&store, false, &["AAPL", "BAD", "MSFT"], Some("key"));
        let cycle = cycle.with_exporter(Box::new(FileExporter::new(
            dir.path().join("out"),
            XmlFormat::StockData,
        )));

        let report = cycle.run().unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);

        let list = watchlist.lock().unwrap();
        assert_eq!(list.get("AAPL").unwrap().price, 101.5);
        assert_eq!(list.get("BAD").unwrap().price, 0.0);
        assert_eq!(store.load(), *list);

        let exported = report.exported.unwrap();
        let xml = std::fs::read_to_string(exported).unwrap();
        assert!(xml.contains("<Price>101.50</Price>"));
        assert!(xml.contains("<Symbol>BAD</Symbol>"));
    }

    #[test]
    fn symbols_added_elsewhere_survive_the_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        let (provider, cycle, watchlist) = setup(&store, false, &["AAPL", "TSLA"], Some("key"));

        let mut edited = store.load();
        edited.remove("TSLA");
        edited.add(SymbolRecord::new("MSFT", "Microsoft"));
        store.save(&edited);

        let report = cycle.run().unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let persisted = store.load();
        assert_eq!(persisted.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(persisted.get("MSFT").unwrap().price, 101.5);
        assert_eq!(*watchlist.lock().unwrap(), persisted);
    }

    #[test]
    fn missing_key_or_empty_list_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path().join("keyless"));
        let (provider, cycle, _) = setup(&store, false, &["AAPL"], None);
        assert_eq!(cycle.run().unwrap(), RefreshReport::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.load().get("AAPL").unwrap().price, 0.0);

        let empty = WatchlistStore::new(dir.path().join("empty"));
        let (provider, cycle, _) = setup(&empty, false, &[], Some("key"));
        assert_eq!(cycle.run().unwrap(), RefreshReport::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("empty").exists());
    }

    #[test]
    fn failed_fetch_leaves_list_and_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        let (provider, cycle, watchlist) = setup(&store, true, &["AAPL", "MSFT"], Some("key"));
        let before = store.load();

        let err = cycle.run().unwrap_err();
        assert!(matches!(err, StockError::UpstreamUnavailable(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*watchlist.lock().unwrap(), before);
        assert_eq!(store.load(), before);
    }
}
