//! Error types shared between client and server.
//!
//! The `StockError` enum unifies the failure cases of the quote pipeline:
//! provider rejections, transport failures, persistence and input validation,
//! plus the plumbing errors (I/O, JSON, HTTP, channels, locks) so that every
//! crate in the workspace can propagate a single error type with `?`.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum StockError {
    /// The provider rejected the credential or answered with a message instead of data.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Network or HTTP-level failure talking to the quote provider or the export server.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Some symbols of a batch came back as errors. Never raised by the fetcher
    /// itself; callers use it to surface the count of error-flagged quotes.
    #[error("{failed} of {total} symbols failed to refresh")]
    PartialBatchFailure {
        /// Number of error-flagged quotes.
        failed: usize,
        /// Number of requested symbols.
        total: usize,
    },

    /// Local save/load failure of persisted client state.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Rejected input: empty parameters, empty stock list and the like.
    #[error("{0}")]
    Validation(String),

    /// I/O error originating from files or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl StockError {
    /// `true` for errors caused by the caller's input rather than by the system.
    pub fn is_validation(&self) -> bool {
        matches!(self, StockError::Validation(_))
    }
}

impl From<reqwest::Error> for StockError {
    fn from(err: reqwest::Error) -> Self {
        StockError::UpstreamUnavailable(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for StockError {
    fn from(err: PoisonError<T>) -> Self {
        StockError::MutexLock(err.to_string())
    }
}
