//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::Result;
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Present paths are kept in a `HashSet` behind a [`RwLock`], so blobs can be
/// added or removed between annotation runs without external
/// synchronisation.
///
/// # Examples
///
/// ```
/// use canopy_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files(["storage/6/f/6f1b17063da8508541eb76dac260748a.mp4"]);
/// assert!(backend.exists(Path::new("storage/6/f/6f1b17063da8508541eb76dac260748a.mp4")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    files: RwLock<HashSet<PathBuf>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut set = HashSet::new();
        for path in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            set.insert(validated);
        }
        Self {
            name: "mock".to_string(),
            files: RwLock::new(set),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make a file present.
    pub async fn insert(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = validate_path(path)?;
        self.files.write().await.insert(path);
        Ok(())
    }

    /// Make a file absent. Returns `true` if it was present.
    pub async fn remove(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.files.write().await.remove(&path))
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [&str; 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.files.read().await.contains(&path))
    }
}
