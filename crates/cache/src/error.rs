//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A statement or transaction failed. Nothing from the failed call was
    /// committed; every annotation stage recomputes from source data, so the
    /// whole call can be retried.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("channel not found: ({_0})")]
    ChannelNotFound(#[error(not(source))] String),
    /// A stored value could not be converted into its model type.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Database.to_string(), "database error");
        assert_eq!(ErrorKind::ChannelNotFound("abc".to_string()).to_string(), "channel not found: (abc)");
        assert_eq!(ErrorKind::InvalidData("level").to_string(), "invalid cache data: level");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Database.is_retryable());
        assert!(!ErrorKind::Migration.is_retryable());
        assert!(!ErrorKind::ChannelNotFound("abc".to_string()).is_retryable());
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::other("locked"));
        let err: Result<()> = result.or_raise(|| ErrorKind::Database);
        assert_eq!(*err.unwrap_err(), ErrorKind::Database);
    }
}
