//! Access to the third-party quote provider.
//!
//! `QuoteProvider` is the seam between the fetcher and the network: it returns
//! the provider's raw JSON payloads and leaves normalization to the fetcher.
//! `TwelveDataProvider` is the production implementation over blocking HTTP.
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::StockError;
use crate::net::{PROVIDER_TIMEZONE, TWELVE_DATA_BASE_URL};
use crate::result::Result;

/// Raw access to the quote provider's symbol-search and quote endpoints.
pub trait QuoteProvider: Send + Sync {
    /// Symbol search for `query`. Returns the payload as-is.
    fn symbol_search(&self, query: &str, api_key: &str) -> Result<Value>;

    /// Quote for one or more symbols in a single request.
    ///
    /// One symbol yields a single quote object; several yield an object keyed
    /// by symbol.
    fn quote(&self, symbols: &[String], api_key: &str) -> Result<Value>;
}

impl<P: QuoteProvider + ?Sized> QuoteProvider for Arc<P> {
    fn symbol_search(&self, query: &str, api_key: &str) -> Result<Value> {
        (**self).symbol_search(query, api_key)
    }

    fn quote(&self, symbols: &[String], api_key: &str) -> Result<Value> {
        (**self).quote(symbols, api_key)
    }
}

/// Twelve Data REST client.
pub struct TwelveDataProvider {
    client: Client,
    base_url: String,
    timezone: String,
}

impl TwelveDataProvider {
    /// Builds a provider against the public Twelve Data endpoint.
    ///
    /// Must be called outside of an async runtime: the blocking client owns
    /// its own.
    pub fn new() -> Result<Self> {
        Self::with_base_url(TWELVE_DATA_BASE_URL)
    }

    /// Builds a provider against an alternative base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone: String::from(PROVIDER_TIMEZONE),
        })
    }

    fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, redact(params));

        let response = self.client.get(&url).query(params).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StockError::UpstreamUnavailable(format!(
                "API error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }
        Ok(response.json::<Value>()?)
    }
}

impl QuoteProvider for TwelveDataProvider {
    fn symbol_search(&self, query: &str, api_key: &str) -> Result<Value> {
        self.get_json(
            "symbol_search",
            &[
                ("symbol", query),
                ("apikey", api_key),
                ("outputsize", "1"),
                ("timezone", self.timezone.as_str()),
                ("interval", "1min"),
            ],
        )
    }

    fn quote(&self, symbols: &[String], api_key: &str) -> Result<Value> {
        let joined = symbols.join(",");
        self.get_json(
            "quote",
            &[
                ("symbol", joined.as_str()),
                ("apikey", api_key),
                ("timezone", self.timezone.as_str()),
            ],
        )
    }
}

/// Query parameters with the credential masked, for logging.
fn redact<'a>(params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .map(|&(k, v)| if k == "apikey" { (k, "***") } else { (k, v) })
        .collect()
}
