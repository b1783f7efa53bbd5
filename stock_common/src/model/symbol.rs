//! Symbol search result.
use serde::{Deserialize, Serialize};

use crate::model::lenient::string_or_empty;

/// A tradable instrument returned by symbol search. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Exchange ticker, unique key of the record.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub symbol: String,
    /// Instrument (company) name.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    /// Exchange the instrument trades on.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub exchange: String,
    /// Instrument type, e.g. `Common Stock`.
    #[serde(rename = "type", default, deserialize_with = "string_or_empty")]
    pub instrument_type: String,
    /// Trading currency.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub currency: String,
}

impl SymbolRecord {
    /// Creates a record with only symbol and name set.
    pub fn new(symbol: &str, name: &str) -> Self {
        SymbolRecord {
            symbol: String::from(symbol),
            name: String::from(name),
            exchange: String::new(),
            instrument_type: String::new(),
            currency: String::new(),
        }
    }
}
