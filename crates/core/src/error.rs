//! Unified error types for swcache.
//!
//! Display strings carry a stable code prefix so host adapters can map them
//! without inspecting the variant.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the caching agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty URL list).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure while talking to the network.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// One asset of the install batch could not be fetched.
    #[error("PRECACHE_FAILED: {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    /// No entry stored for the given bucket and URL.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A bucket could not be opened or read outside of SQLite.
    #[error("CACHE_ERROR: {0}")]
    CacheUnavailable(String),

    /// Lifecycle operation requested from the wrong state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidUrl(_) => -32003,
            Error::Network(_) => -32008,
            Error::FetchTimeout(_) => -32006,
            Error::FetchTooLarge(_) => -32007,
            Error::PrecacheFailed { .. } => -32013,
            Error::CacheMiss(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CacheUnavailable(_) => -32002,
            Error::InvalidState(_) => -32014,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
