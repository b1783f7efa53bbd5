//! Stock XML export server.
//!
//! This binary exposes the quote pipeline over HTTP and materializes the XML
//! document consumed by the broadcast-graphics product. Internally, it wires
//! together three building blocks:
//!
//! - `TwelveDataProvider`: blocking HTTP access to the quote provider.
//! - `QuoteFetcher`: search, cached quotes and batch quotes; constructed once
//!   and shared by every request through an `Arc`.
//! - `server`: the axum router: `GET /api/stocks`, `POST /api/xml`, and static
//!   serving of the public directory the document is written to.
//!
//! Request handlers run fetcher calls on tokio's blocking pool. Errors are
//! mapped to `400` for invalid input and `500` for everything else, with a
//! `{ "error": message }` body.
#![warn(missing_docs)]
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;
use stock_common::provider::TwelveDataProvider;
use stock_common::{QuoteFetcher, Result, StockError};

use crate::args::Args;
use crate::server::{AppState, run_server};

mod args;
pub mod model;
mod server;

fn main() -> Result<(), StockError> {
    init_logger();
    let args = Args::parse();

    let provider = TwelveDataProvider::with_base_url(&args.provider_url)?;
    let fetcher = Arc::new(
        QuoteFetcher::new(provider)
            .with_cache_ttl(Duration::from_secs(args.cache_ttl_secs))
            .with_min_query_len(args.min_query_len),
    );
    info!(
        "Quote cache TTL {}s, XML documents go to {}",
        args.cache_ttl_secs,
        args.public_dir.display()
    );

    let state = AppState::new(Arc::clone(&fetcher), args.public_dir.clone());
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run_server(state, &args.bind, args.port));

    // The blocking HTTP client inside the fetcher must be dropped outside the runtime.
    drop(runtime);
    drop(fetcher);
    result
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
