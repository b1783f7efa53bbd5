//! Stock Client: a command-line front end for the stock XML feed. It searches
//! ticker symbols through Twelve Data, keeps a persistent watch-list, refreshes
//! its prices and exports it as the XML document consumed by the broadcast
//! graphics, either as a dated local file or through the export server.
//!
//! Usage example (CLI):
//! ```bash
//! stock_client set-key <twelve data key>
//! stock_client add AAPL
//! stock_client watch --interval 30 --format ticker --server http://127.0.0.1:3000
//! ```
//!
//! The API key can also be supplied per invocation with `--api-key` or the
//! `TWELVEDATA_API_KEY` environment variable.
#![warn(missing_docs)]
mod args;
mod debounce;
mod export;
mod refresh;
mod scheduler;
mod store;

use crate::args::{Cli, Commands, ExportArgs};
use crate::debounce::{DEFAULT_QUIET, SearchDebouncer};
use crate::export::{Exporter, FileExporter, ServerExporter};
use crate::refresh::RefreshCycle;
use crate::scheduler::RefreshScheduler;
use crate::store::WatchlistStore;
use clap::Parser;
use log::{error, info, warn};
use std::io::{self, BufRead};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use stock_common::provider::TwelveDataProvider;
use stock_common::{QuoteFetcher, Result, StockError, SymbolRecord, WatchlistEntry};

const MISSING_KEY: &str = "API key is required. Run `set-key` or pass --api-key";

fn main() -> Result<(), StockError> {
    init_logger();
    let cli = Cli::parse();

    let store = WatchlistStore::new(
        cli.data_dir
            .clone()
            .unwrap_or_else(WatchlistStore::default_dir),
    );
    let api_key = cli
        .api_key
        .clone()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .or_else(|| store.load_api_key());

    let provider = TwelveDataProvider::with_base_url(&cli.provider_url)?;
    let fetcher = Arc::new(QuoteFetcher::new(provider));

    match cli.command {
        Commands::SetKey { key } => {
            let key = key.trim();
            if !fetcher.validate_credential(key) {
                return Err(StockError::InvalidCredential("Invalid API key".to_string()));
            }
            store.save_api_key(key);
            println!("API key saved to {}", store.dir().display());
        }
        Commands::Search { query, follow } => {
            let key = require_key(&api_key)?;
            if query.is_none() && !follow {
                return Err(StockError::Validation(
                    "Provide a query or use --follow".to_string(),
                ));
            }
            if let Some(query) = query {
                let records = fetcher.search_symbols(&query, key)?;
                print_records(&query, &records);
            }
            if follow {
                follow_search(Arc::clone(&fetcher), key.to_string())?;
            }
        }
        Commands::Add { symbol } => {
            let key = require_key(&api_key)?;
            match add_symbol(&fetcher, &store, &symbol, key)? {
                Some(entry) => println!("Added {}", format_entry(&entry)),
                None => println!("{} is already in the watch-list", symbol.trim()),
            }
        }
        Commands::Remove { symbol } => {
            let mut list = store.load();
            if list.remove(symbol.trim()) {
                store.save(&list);
                println!("Removed {}", symbol.trim());
            } else {
                println!("{} is not in the watch-list", symbol.trim());
            }
        }
        Commands::Clear => {
            store.clear();
            println!("Watch-list cleared");
        }
        Commands::List => {
            let list = store.load();
            if list.is_empty() {
                println!("Watch-list is empty");
            }
            for entry in list.entries() {
                println!("{}", format_entry(entry));
            }
        }
        Commands::Refresh => {
            let watchlist = Arc::new(Mutex::new(store.load()));
            let cycle = RefreshCycle::new(fetcher, Arc::clone(&watchlist), store, api_key);
            let report = cycle.run()?;
            println!("Updated {} stocks, {} failed", report.updated, report.failed);
            for entry in watchlist.lock()?.entries() {
                println!("{}", format_entry(entry));
            }
        }
        Commands::Export(export) => {
            let list = store.load();
            let location = build_exporter(&export)?.export(list.entries())?;
            println!("Exported {} stocks to {}", list.len(), location);
        }
        Commands::Preview { format } => {
            println!("{}", format.render(store.load().entries()));
        }
        Commands::Watch { interval, export } => {
            require_key(&api_key)?;
            let watchlist = Arc::new(Mutex::new(store.load()));
            let cycle = Arc::new(
                RefreshCycle::new(fetcher, watchlist, store, api_key)
                    .with_exporter(build_exporter(&export)?),
            );
            watch(cycle, Duration::from_secs(interval))?;
        }
    }

    Ok(())
}

/// Look up `symbol`, price it and append it to the stored watch-list.
///
/// Returns `None` when the symbol is already listed.
fn add_symbol(
    fetcher: &QuoteFetcher,
    store: &WatchlistStore,
    symbol: &str,
    api_key: &str,
) -> Result<Option<WatchlistEntry>> {
    let mut list = store.load();
    if list.contains(symbol.trim()) {
        return Ok(None);
    }
    let record = fetcher
        .lookup_symbol(symbol, api_key)?
        .ok_or_else(|| StockError::Validation(format!("No symbol matching {}", symbol.trim())))?;
    if list.contains(&record.symbol) {
        return Ok(None);
    }

    let mut entry = WatchlistEntry::new(record);
    let quote = fetcher.get_quote(entry.symbol(), api_key);
    if !entry.merge_quote(&quote) {
        warn!("Added {} without a price: {:?}", entry.symbol(), quote.message);
    }
    list.add(entry.clone());
    store.save(&list);
    Ok(Some(entry))
}

/// Refresh now, then every `interval` until Ctrl+C.
fn watch(cycle: Arc<RefreshCycle>, interval: Duration) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Stopping refresh...");
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| StockError::Io(io::Error::other(e)))?;

    run_logged(&cycle);
    let scheduled = Arc::clone(&cycle);
    let handle = RefreshScheduler::start(interval, move || run_logged(&scheduled));

    info!("Refreshing every {:?}. Press Ctrl+C to exit.", interval);
    let _ = shutdown_rx.recv();
    handle.join();
    Ok(())
}

fn run_logged(cycle: &RefreshCycle) {
    match cycle.run() {
        Ok(report) => {
            if let Some(location) = report.exported {
                info!("Exported to {}", location);
            }
        }
        Err(e) => error!("Refresh failed: {}", e),
    }
}

/// Read queries from stdin, one per line, searching only once typing pauses.
fn follow_search(fetcher: Arc<QuoteFetcher>, api_key: String) -> Result<()> {
    let (debouncer, outcomes) = SearchDebouncer::start(DEFAULT_QUIET, move |query: &str| {
        fetcher.search_symbols(query, &api_key)
    });

    let printer = thread::spawn(move || {
        for outcome in outcomes {
            match outcome.result {
                Ok(records) => print_records(&outcome.query, &records),
                Err(e) => error!("Search for {:?} failed: {}", outcome.query, e),
            }
        }
    });

    for line in io::stdin().lock().lines() {
        debouncer.submit(&line?)?;
    }
    debouncer.finish();
    if printer.join().is_err() {
        error!("Search printer thread panicked");
    }
    Ok(())
}

fn build_exporter(args: &ExportArgs) -> Result<Box<dyn Exporter>> {
    Ok(match &args.server {
        Some(url) => Box::new(ServerExporter::new(url, args.format)?),
        None => Box::new(FileExporter::new(args.out.clone(), args.format)),
    })
}

fn require_key(api_key: &Option<String>) -> Result<&str> {
    api_key
        .as_deref()
        .ok_or_else(|| StockError::InvalidCredential(MISSING_KEY.to_string()))
}

fn print_records(query: &str, records: &[SymbolRecord]) {
    if records.is_empty() {
        println!("No symbols found for {:?}", query);
    }
    for record in records {
        println!(
            "{:<10} {:<40} {:<10} {:<16} {}",
            record.symbol, record.name, record.exchange, record.instrument_type, record.currency
        );
    }
}

/// One watch-list line: `AAPL  Apple Inc  $150.50  +2.25 (1.50%)`.
fn format_entry(entry: &WatchlistEntry) -> String {
    let sign = if entry.change >= 0.0 { "+" } else { "" };
    format!(
        "{:<10} {:<40} ${:.2}  {}{:.2} ({:.2}%)",
        entry.symbol(),
        entry.record.name,
        entry.price,
        sign,
        entry.change,
        entry.percent_change
    )
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use stock_common::provider::QuoteProvider;

    #[test]
    fn entry_line_shows_price_and_signed_change() {
        let mut entry = WatchlistEntry::new(SymbolRecord::new("AAPL", "Apple Inc"));
        entry.price = 150.5;
        entry.change = 2.25;
        entry.percent_change = 1.5;
        let line = format_entry(&entry);
        assert!(line.starts_with("AAPL "));
        assert!(line.ends_with("$150.50  +2.25 (1.50%)"), "{}", line);

        entry.change = -1.2;
        entry.percent_change = -0.79;
        assert!(format_entry(&entry).ends_with("-1.20 (-0.79%)"));
    }

    struct FordProvider;

    impl QuoteProvider for FordProvider {
        fn symbol_search(&self, _query: &str, _api_key: &str) -> Result<Value> {
            Ok(json!({"data": [
                {"symbol": "F", "instrument_name": "Ford Motor Co", "exchange": "NYSE"}
            ]}))
        }

        fn quote(&self, symbols: &[String], _api_key: &str) -> Result<Value> {
            Ok(json!({"symbol": symbols[0], "close": "12.10", "change": "0.2", "percent_change": "1.68"}))
        }
    }

    #[test]
    fn one_letter_ticker_can_be_added_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        let fetcher = QuoteFetcher::new(FordProvider);

        let entry = add_symbol(&fetcher, &store, "f", "key").unwrap().unwrap();
        assert_eq!(entry.symbol(), "F");
        assert_eq!(entry.price, 12.1);
        assert_eq!(store.load().symbols(), vec!["F"]);

        assert!(add_symbol(&fetcher, &store, "F", "key").unwrap().is_none());
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn unknown_symbol_is_not_added() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatchlistStore::new(dir.path());
        let fetcher = QuoteFetcher::new(FordProvider);

        let err = add_symbol(&fetcher, &store, "GM", "key").unwrap_err();
        assert!(err.is_validation());
        assert!(store.load().is_empty());
    }

    #[test]
    fn missing_key_is_an_invalid_credential() {
        assert!(matches!(
            require_key(&None),
            Err(StockError::InvalidCredential(_))
        ));
        assert_eq!(require_key(&Some("k".to_string())).unwrap(), "k");
    }
}
