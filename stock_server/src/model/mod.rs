//! Request and response bodies of the HTTP boundary.
//!
//! - `StocksParams`: query string of `GET /api/stocks`.
//! - `XmlRequest` / `XmlResponse`: body and reply of `POST /api/xml`.
//! - `ErrorBody`: `{ "error": message }` returned with 4xx/5xx statuses.

use serde::{Deserialize, Serialize};
use stock_common::{WatchlistEntry, XmlFormat};

/// Query string of `GET /api/stocks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StocksParams {
    /// Symbol to quote.
    pub symbol: Option<String>,
    /// Search text.
    pub query: Option<String>,
    /// Provider credential.
    pub api_key: Option<String>,
}

/// Body of `POST /api/xml`.
#[derive(Debug, Deserialize)]
pub struct XmlRequest {
    /// Watch-list entries to render.
    #[serde(default)]
    pub stocks: Option<Vec<WatchlistEntry>>,
    /// Document shape, `stock-data` when absent.
    #[serde(default)]
    pub format: Option<XmlFormat>,
}

/// Reply of a successful `POST /api/xml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct XmlResponse {
    /// Always `true`.
    pub success: bool,
    /// Public path the document is served under.
    pub path: String,
}

/// Error reply.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}
