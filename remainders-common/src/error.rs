//! Common error types for the remainders service

use thiserror::Error;

/// Common result type for remainders operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by resolution, search and the record source
#[derive(Error, Debug)]
pub enum Error {
    /// A recipient segment could not be split into role/id prefix and email.
    /// Fatal for the containing record and the whole batch.
    #[error("Malformed recipient segment {segment:?} in record {record}")]
    MalformedRecipientSegment { record: String, segment: String },

    /// Search phrase reduced to nothing after sanitization
    #[error("Invalid search: phrase is empty after sanitization")]
    SanitizationEmpty,

    /// Record fetch failed (connection, query or pool error)
    #[error("Record source unavailable: {0}")]
    SourceUnavailable(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
