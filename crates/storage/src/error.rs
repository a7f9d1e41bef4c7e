//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The checksum and extension pair does not form a valid storage filename.
    /// The blob can never be located, so callers skip it rather than fail.
    #[display("invalid storage filename: {_0}")]
    InvalidFilename(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::InvalidFilename("nope.mp4".to_string()).to_string(),
            "invalid storage filename: nope.mp4"
        );
        assert_eq!(ErrorKind::NotFound(PathBuf::from("a/b.mp4")).to_string(), "file not found: a/b.mp4");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io(IoError::other("disk went away")).is_retryable());
        assert!(!ErrorKind::InvalidFilename("x".to_string()).is_retryable());
        assert!(!ErrorKind::InvalidPath(PathBuf::from("../x")).is_retryable());
    }
}
