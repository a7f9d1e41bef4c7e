//! Annotation Error Types
//!
//! Errors from the underlying crates are wrapped (not flattened), so the full
//! error tree stays available to whoever reports it.

use derive_more::{Display, Error};

/// An annotation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for annotation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog database failed. No partial update was committed.
    #[display("content catalog error")]
    Cache,
    #[display("content storage error")]
    Storage,
    #[display("configuration error")]
    Config,
    #[display("channel not found: ({_0})")]
    ChannelNotFound(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Every annotation stage recomputes from source data, so a failed call
    /// can be repeated as a whole.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache | Self::Storage)
    }
}
