//! Storage backend trait and implementations.
//!
//! The annotation job only ever needs to know whether a blob is present, so
//! the trait is deliberately read-only and small. Backends are resolved to a
//! [`BackendHandle`](crate::BackendHandle) once and shared.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for content storage backends.
///
/// # Path Handling
/// All paths are relative to the content root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use canopy_storage::{backend::StorageBackend, content_path, error::Result};
///
/// async fn is_present(backend: &dyn StorageBackend, checksum: &str, extension: &str) -> Result<bool> {
///     let path = content_path(checksum, extension)?;
///     backend.exists(&path).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// Check whether a file exists at the given relative path.
    ///
    /// A missing file is `Ok(false)`, never an error. Errors are reserved for
    /// paths that could not be checked at all (invalid path, permissions).
    async fn exists(&self, path: &Path) -> Result<bool>;
}
