//! Shared networking constants and helpers used by client and server.

/// Default TCP port of the export server.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Route serving quotes and symbol search.
pub const STOCKS_ROUTE: &str = "/api/stocks";
/// Route materializing the XML document.
pub const XML_ROUTE: &str = "/api/xml";

/// Base URL of the Twelve Data REST API.
pub const TWELVE_DATA_BASE_URL: &str = "https://api.twelvedata.com";
/// Time zone the provider normalizes timestamps to.
pub const PROVIDER_TIMEZONE: &str = "Asia/Ulaanbaatar";

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
