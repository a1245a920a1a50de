//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A cache document is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] jamail_codec::json::Error),

    /// A cache document could not be converted to or from UTF-8.
    #[error("Charset error: {0}")]
    Charset(#[from] jamail_codec::ConvError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A server or message id cannot be used as a cache key.
    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    /// No entry exists for the key.
    #[error("Cache entry not found: {server_id}/{msg_id}")]
    NotFound {
        /// Server the entry was looked up for.
        server_id: String,
        /// Message id that was looked up.
        msg_id: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
