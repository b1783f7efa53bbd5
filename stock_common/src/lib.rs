//!
//! Common types and utilities shared by the stock XML server and client.
//!
//! This crate aggregates:
//! - `error`: unified error type `StockError` used across the workspace.
//! - `result`: handy `Result<T, StockError>` alias.
//! - `model`: symbol records, quotes and the watch-list.
//! - `xml`: the `StockData` and `Ticker` XML documents.
//! - `provider`: raw access to the quote provider (Twelve Data).
//! - `cache`: the time-based quote cache.
//! - `fetcher`: search, single and batch quotes over provider and cache.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod net;
pub mod provider;
pub mod result;
pub mod xml;

pub use error::StockError;
pub use fetcher::QuoteFetcher;
pub use model::{Quote, SymbolRecord, Watchlist, WatchlistEntry};
pub use result::Result;
pub use xml::XmlFormat;
