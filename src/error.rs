//! Error types for track-dl
//!
//! Only setup problems ever reach the caller of [`Pipeline::run`](crate::Pipeline::run):
//! an invalid configuration or an output directory that cannot be created.
//! Everything that goes wrong while processing a single item is converted into
//! an [`Event`](crate::Event) at the worker boundary and reported to the sink.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for track-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for track-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_workers")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (spawn error or non-zero exit)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// A resolve or fetch call did not finish within its deadline
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        /// The operation that timed out ("resolve" or "fetch")
        operation: &'static str,
        /// The deadline that was exceeded
        after: Duration,
    },

    /// The batch was cancelled before the operation finished
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for an [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error came from the batch being cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
