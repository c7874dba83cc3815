//! Error types for the execution monitor.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while monitoring an execution layer node.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to set up the connection to the node.
    #[error("connection error: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON-RPC error returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// Error code.
        code: i64,
        /// Error message.
        message: String,
    },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The node answered with a null `result` where a value was required.
    #[error("{method} returned a null result")]
    NullResult {
        /// RPC method that was called.
        method: &'static str,
    },

    /// The node does not know the requested block.
    #[error("block {block} not found")]
    NotFound {
        /// Requested block, as a number or tag.
        block: String,
    },

    /// The call did not complete within its deadline.
    #[error("{method} exceeded its deadline of {timeout:?}")]
    DeadlineExceeded {
        /// RPC method that was called.
        method: &'static str,
        /// Deadline window of the call.
        timeout: Duration,
    },

    /// The call was superseded or the client was closed while it was in flight.
    #[error("{method} was cancelled")]
    Cancelled {
        /// RPC method that was called.
        method: &'static str,
    },

    /// Walked back to genesis without finding a block with non-zero difficulty.
    #[error("unable to find the TTD block scanning back from block {head}")]
    TransitionNotFound {
        /// Head block the scan started from.
        head: u64,
    },

    /// Requested metric is not supported.
    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),

    /// Client type string names no supported implementation.
    #[error("unsupported client type `{value}`, expect one of [{supported}]")]
    UnsupportedClientType {
        /// Rejected input.
        value: String,
        /// Comma separated list of accepted names.
        supported: String,
    },

    /// The client has been closed.
    #[error("client is closed")]
    Closed,

    /// Failed to load or parse configuration.
    #[error("config error: {0}")]
    Config(String),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml_edit::de::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
