//! Quote data model.
//!
//! A `Quote` is a point-in-time price snapshot for one symbol. A fetch that
//! fails for a symbol still produces a `Quote`, flagged with `error` and a
//! `message`, so callers can render partial results instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::lenient::f64_or_zero;

/// Market quote for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Symbol identifier.
    pub symbol: String,
    /// Instrument name when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Exchange when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Last price.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub price: f64,
    /// Absolute change against the previous close.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub change: f64,
    /// Relative change in percent.
    #[serde(default, deserialize_with = "f64_or_zero")]
    pub percent_change: f64,
    /// When the quote was produced.
    pub timestamp: DateTime<Utc>,
    /// Set when this quote is an error sentinel for the current fetch.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    /// Failure message accompanying `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Quote {
    /// Builds a populated quote.
    pub fn new(symbol: &str, price: f64, change: f64, percent_change: f64) -> Self {
        Quote {
            symbol: String::from(symbol),
            name: None,
            exchange: None,
            price,
            change,
            percent_change,
            timestamp: Utc::now(),
            error: false,
            message: None,
        }
    }

    /// Builds an error-flagged quote with zeroed numbers.
    pub fn failed(symbol: &str, message: impl Into<String>) -> Self {
        Quote {
            error: true,
            message: Some(message.into()),
            ..Quote::new(symbol, 0.0, 0.0, 0.0)
        }
    }

    /// `true` when this quote carries a failure instead of a price.
    pub fn is_error(&self) -> bool {
        self.error
    }
}
