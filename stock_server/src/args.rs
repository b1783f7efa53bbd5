//! Command-line arguments for the export server.
use std::path::PathBuf;

use clap::Parser;
use stock_common::fetcher::MIN_QUERY_LEN;
use stock_common::net::{DEFAULT_SERVER_PORT, TWELVE_DATA_BASE_URL};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Interface to bind the HTTP server to.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// TCP port of the HTTP server.
    #[clap(long, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Directory the XML documents are written to and served from.
    #[clap(long, default_value = "public")]
    pub public_dir: PathBuf,

    /// Seconds a fetched quote is served from the cache.
    #[clap(long, default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Searches shorter than this many characters return no results.
    #[clap(long, default_value_t = MIN_QUERY_LEN)]
    pub min_query_len: usize,

    /// Base URL of the quote provider.
    #[clap(long, default_value = TWELVE_DATA_BASE_URL)]
    pub provider_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["stock_server"]);
        assert_eq!(args.port, DEFAULT_SERVER_PORT);
        assert_eq!(args.public_dir, PathBuf::from("public"));
        assert_eq!(args.cache_ttl_secs, 300);
        assert_eq!(args.min_query_len, 2);
    }
}
