//! Watch-list entries and the ordered, symbol-unique collection holding them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::lenient::f64_or_zero;
use crate::model::{Quote, SymbolRecord};

/// A selected symbol together with its latest merged quote values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    /// Search record the entry was created from.
    #[serde(flatten)]
    pub record: SymbolRecord,
    /// Last merged price.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub price: f64,
    /// Last merged absolute change.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub change: f64,
    /// Last merged percent change.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub percent_change: f64,
}

impl WatchlistEntry {
    /// New entry with zeroed quote fields.
    pub fn new(record: SymbolRecord) -> Self {
        WatchlistEntry {
            record,
            price: 0.0,
            change: 0.0,
            percent_change: 0.0,
        }
    }

    /// Ticker of the entry.
    pub fn symbol(&self) -> &str {
        &self.record.symbol
    }

    /// Overwrite price/change/percent change from `quote`.
    ///
    /// Error-flagged quotes leave the entry untouched. Returns whether the
    /// entry changed.
    pub fn merge_quote(&mut self, quote: &Quote) -> bool {
        if quote.is_error() || quote.symbol != self.record.symbol {
            return false;
        }
        self.price = quote.price;
        self.change = quote.change;
        self.percent_change = quote.percent_change;
        true
    }
}

impl From<SymbolRecord> for WatchlistEntry {
    fn from(record: SymbolRecord) -> Self {
        WatchlistEntry::new(record)
    }
}

/// The user's selection, unique by symbol, in insertion order.
///
/// Serializes as a plain JSON array so the persisted form is the list itself;
/// duplicates in a deserialized array are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<WatchlistEntry>", into = "Vec<WatchlistEntry>")]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    /// Empty watch-list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a watch-list from entries, dropping later duplicates of a symbol.
    pub fn from_entries(entries: Vec<WatchlistEntry>) -> Self {
        let mut list = Watchlist::new();
        for entry in entries {
            list.add(entry);
        }
        list
    }

    /// Appends `entry` unless its symbol is already present. Returns whether it was added.
    pub fn add(&mut self, entry: impl Into<WatchlistEntry>) -> bool {
        let entry = entry.into();
        if self.contains(entry.symbol()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes the entry for `symbol`. Returns whether something was removed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.symbol() != symbol);
        self.entries.len() != before
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether `symbol` is on the list.
    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|entry| entry.symbol() == symbol)
    }

    /// Entry for `symbol`.
    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|entry| entry.symbol() == symbol)
    }

    /// Symbols in display order.
    pub fn symbols(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.symbol().to_string()).collect()
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges fetched quotes into matching entries.
    ///
    /// Entries without a quote, or whose quote is error-flagged, keep their
    /// previous values. Returns the number of entries updated.
    pub fn merge_quotes(&mut self, quotes: &[Quote]) -> usize {
        let by_symbol: HashMap<&str, &Quote> = quotes
            .iter()
            .map(|quote| (quote.symbol.as_str(), quote))
            .collect();

        self.entries
            .iter_mut()
            .filter_map(|entry| {
                by_symbol
                    .get(entry.symbol())
                    .map(|quote| entry.merge_quote(quote))
            })
            .filter(|updated| *updated)
            .count()
    }
}

impl From<Vec<WatchlistEntry>> for Watchlist {
    fn from(entries: Vec<WatchlistEntry>) -> Self {
        Watchlist::from_entries(entries)
    }
}

impl From<Watchlist> for Vec<WatchlistEntry> {
    fn from(list: Watchlist) -> Self {
        list.entries
    }
}
