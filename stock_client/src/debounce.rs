//! Debounced symbol search.
//!
//! Queries are submitted as the user types. A search is only issued once no
//! newer query has arrived for the quiet period; intermediate queries are
//! dropped, not cancelled in flight. Outcomes are delivered on a channel.
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, error};
use stock_common::{Result, StockError, SymbolRecord};

/// Default quiet period before a search is issued.
pub const DEFAULT_QUIET: Duration = Duration::from_millis(500);

/// Result of one issued search.
#[derive(Debug)]
pub struct SearchOutcome {
    /// The query that was searched.
    pub query: String,
    /// Matching symbols or the search failure.
    pub result: Result<Vec<SymbolRecord>>,
}

/// Background searcher fed with the latest query text.
pub struct SearchDebouncer {
    query_tx: Sender<String>,
    thread: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Spawn the debouncer. `search` runs on the background thread.
    pub fn start<F>(quiet: Duration, search: F) -> (Self, Receiver<SearchOutcome>)
    where
        F: Fn(&str) -> Result<Vec<SymbolRecord>> + Send + 'static,
    {
        let (query_tx, query_rx) = unbounded::<String>();
        let (outcome_tx, outcome_rx) = unbounded::<SearchOutcome>();

        let thread = thread::spawn(move || {
            let mut pending: Option<String> = None;
            loop {
                let next = if pending.is_some() {
                    query_rx.recv_timeout(quiet)
                } else {
                    query_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                };

                match next {
                    Ok(query) => {
                        if let Some(dropped) = pending.replace(query) {
                            debug!("Superseded search {:?}", dropped);
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if let Some(query) = pending.take() {
                            if !issue(&search, query, &outcome_tx) {
                                break;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        if let Some(query) = pending.take() {
                            issue(&search, query, &outcome_tx);
                        }
                        break;
                    }
                }
            }
        });

        (SearchDebouncer { query_tx, thread }, outcome_rx)
    }

    /// Submit the current query text.
    pub fn submit(&self, query: &str) -> Result<()> {
        self.query_tx
            .send(query.to_string())
            .map_err(|e| StockError::ChannelSend(e.to_string()))
    }

    /// Issue the pending query, if any, and stop the background thread.
    pub fn finish(self) {
        drop(self.query_tx);
        if self.thread.join().is_err() {
            error!("Search thread panicked");
        }
    }
}

/// Run one search and deliver it. Returns `false` once nobody listens.
fn issue<F>(search: &F, query: String, outcome_tx: &Sender<SearchOutcome>) -> bool
where
    F: Fn(&str) -> Result<Vec<SymbolRecord>>,
{
    debug!("Searching {:?}", query);
    let result = search(&query);
    outcome_tx.send(SearchOutcome { query, result }).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_search(calls: Arc<AtomicUsize>) -> impl Fn(&str) -> Result<Vec<SymbolRecord>> {
        move |query: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SymbolRecord::new(&query.to_uppercase(), "match")])
        }
    }

    #[test]
    fn only_the_last_keystroke_is_searched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (debouncer, outcomes) =
            SearchDebouncer::start(Duration::from_millis(60), counting_search(Arc::clone(&calls)));

        for query in ["a", "ap", "app", "appl"] {
            debouncer.submit(query).unwrap();
        }
        let outcome = outcomes.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(outcome.query, "appl");
        assert_eq!(outcome.result.unwrap()[0].symbol, "APPL");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        debouncer.submit("msft").unwrap();
        let outcome = outcomes.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(outcome.query, "msft");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        debouncer.finish();
    }

    #[test]
    fn finish_flushes_the_pending_query() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (debouncer, outcomes) =
            SearchDebouncer::start(Duration::from_secs(60), counting_search(Arc::clone(&calls)));

        debouncer.submit("tsla").unwrap();
        debouncer.finish();

        let outcome = outcomes.try_recv().unwrap();
        assert_eq!(outcome.query, "tsla");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn search_errors_are_delivered() {
        let (debouncer, outcomes) = SearchDebouncer::start(Duration::from_millis(10), |_: &str| {
            Err(StockError::UpstreamUnavailable("offline".into()))
        });
        debouncer.submit("aapl").unwrap();
        let outcome = outcomes.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(outcome.result, Err(StockError::UpstreamUnavailable(_))));
        debouncer.finish();
    }
}
