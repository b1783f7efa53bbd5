//! Domain records exchanged between the provider, the client and the server.
//!
//! - `symbol`: `SymbolRecord` produced by symbol search.
//! - `quote`: point-in-time `Quote`, possibly error-flagged.
//! - `watchlist`: `WatchlistEntry` and the ordered, symbol-unique `Watchlist`.
//! - `lenient`: numeric coercion used wherever loosely-typed JSON enters.

pub mod lenient;
pub mod quote;
pub mod symbol;
pub mod watchlist;

pub use quote::Quote;
pub use symbol::SymbolRecord;
pub use watchlist::{Watchlist, WatchlistEntry};
