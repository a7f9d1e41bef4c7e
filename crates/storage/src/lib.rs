//! Content storage layout and blob presence checks.
//!
//! Every blob in the content store is addressed by its checksum and file
//! extension. [`content_path`] turns that pair into a path relative to the
//! content root, and a [`StorageBackend`] answers whether the blob is
//! physically present at that path.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::{content_file_name, content_path, validate as validate_path};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
