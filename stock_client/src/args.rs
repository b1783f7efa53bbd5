//! Command-line arguments for the stock client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stock_common::XmlFormat;
use stock_common::net::TWELVE_DATA_BASE_URL;

use crate::scheduler::DEFAULT_INTERVAL;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the watch-list and the stored API key.
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Twelve Data API key. Falls back to the key saved with `set-key`.
    #[clap(long, global = true, env = "TWELVEDATA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the quote provider.
    #[clap(long, global = true, default_value = TWELVE_DATA_BASE_URL)]
    pub provider_url: String,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Client subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate and store the API key.
    SetKey {
        /// The key to store.
        key: String,
    },
    /// Search ticker symbols.
    Search {
        /// Search text, at least two characters.
        query: Option<String>,
        /// Keep reading queries from stdin, one per line.
        #[clap(long)]
        follow: bool,
    },
    /// Add the symbol matching a search exactly.
    Add {
        /// Ticker symbol, e.g. AAPL.
        symbol: String,
    },
    /// Remove a symbol from the watch-list.
    Remove {
        /// Ticker symbol.
        symbol: String,
    },
    /// Remove every symbol from the watch-list.
    Clear,
    /// Show the watch-list with its last known prices.
    List,
    /// Fetch fresh quotes for the whole watch-list once.
    Refresh,
    /// Export the watch-list as XML.
    Export(ExportArgs),
    /// Print the XML document to stdout.
    Preview {
        /// Document shape.
        #[clap(long, value_enum, default_value_t = XmlFormat::StockData)]
        format: XmlFormat,
    },
    /// Refresh periodically until Ctrl+C, exporting after every refresh.
    Watch {
        /// Seconds between refreshes (e.g. 10, 30, 60, 120, 300).
        #[clap(long, default_value_t = DEFAULT_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
        #[command(flatten)]
        export: ExportArgs,
    },
}

/// Where and how to export.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Document shape.
    #[clap(long, value_enum, default_value_t = XmlFormat::StockData)]
    pub format: XmlFormat,

    /// Directory for the dated download file.
    #[clap(long, conflicts_with = "server", default_value = ".")]
    pub out: PathBuf,

    /// Export through the server at this URL instead, e.g. http://127.0.0.1:3000.
    #[clap(long)]
    pub server: Option<String>,
}
