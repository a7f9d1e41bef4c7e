//! Reconciliation of stored local file availability against the content store.

use canopy_cache::LocalFile;
use canopy_storage::{StorageBackend, content_path};
use std::collections::BTreeSet;

/// Local files whose stored availability disagrees with the content store.
///
/// The two sets are always disjoint: each candidate lands in at most one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Present in the store but flagged unavailable.
    pub available: BTreeSet<String>,
    /// Flagged available but missing from the store.
    pub unavailable: BTreeSet<String>,
    /// Candidates whose checksum and extension can't name a blob.
    pub skipped: usize,
}
impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.unavailable.is_empty()
    }
}

/// Probe the store for every candidate, one at a time.
///
/// A probe that fails (other than the blob being missing) counts as absent:
/// a blob that can't be read can't be served either.
pub(crate) async fn reconcile(files: &[LocalFile], backend: &dyn StorageBackend) -> Reconciliation {
    let mut result = Reconciliation::default();
    for file in files {
        let path = match content_path(&file.checksum, &file.extension) {
            Ok(path) => path,
            // Such a blob can never be located; skip it rather than fail.
            Err(err) => {
                tracing::debug!(checksum = %file.checksum, error = %*err, "Skipping local file with invalid storage filename");
                result.skipped += 1;
                continue;
            },
        };
        let present = match backend.exists(&path).await {
            Ok(present) => present,
            Err(err) => {
                tracing::warn!(
                    backend = backend.name(),
                    path = %path.display(),
                    error = ?err,
                    "Could not check local file; treating it as missing",
                );
                false
            },
        };
        match (present, file.available) {
            (true, false) => {
                result.available.insert(file.checksum.clone());
            },
            (false, true) => {
                result.unavailable.insert(file.checksum.clone());
            },
            _ => {},
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use canopy_storage::backend::MockBackend;
    use canopy_storage::error::ErrorKind as StorageErrorKind;
    use std::path::{Path, PathBuf};

    /// Backend whose every probe fails.
    struct FailingBackend;

    #[async_trait]
    impl StorageBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn exists(&self, path: &Path) -> canopy_storage::error::Result<bool> {
            exn::bail!(StorageErrorKind::PermissionDenied(path.to_path_buf()))
        }
    }

    fn file(checksum: &str, extension: &str, available: bool) -> LocalFile {
        LocalFile {
            checksum: checksum.to_string(),
            extension: extension.to_string(),
            file_size: 1,
            available,
        }
    }

    fn present(checksum: &str, extension: &str) -> PathBuf {
        content_path(checksum, extension).unwrap()
    }

    #[tokio::test]
    async fn test_reconcile() {
        let backend = MockBackend::with_files([
            present("a0000000000000000000000000000000", "mp4"),
            present("b0000000000000000000000000000000", "mp4"),
        ]);
        let files = [
            // Present, flagged unavailable.
            file("a0000000000000000000000000000000", "mp4", false),
            // Present, already available.
            file("b0000000000000000000000000000000", "mp4", true),
            // Missing, flagged available.
            file("c0000000000000000000000000000000", "mp4", true),
            // Missing, already unavailable.
            file("d0000000000000000000000000000000", "mp4", false),
        ];
        let result = reconcile(&files, &backend).await;
        assert_eq!(result.available, BTreeSet::from(["a0000000000000000000000000000000".to_string()]));
        assert_eq!(result.unavailable, BTreeSet::from(["c0000000000000000000000000000000".to_string()]));
        assert_eq!(result.skipped, 0);
        assert!(result.available.is_disjoint(&result.unavailable));
    }

    #[tokio::test]
    async fn test_invalid_filenames_are_skipped() {
        let backend = MockBackend::default();
        let files = [
            file("not-a-checksum", "mp4", true),
            file("A0000000000000000000000000000000", "mp4", true),
            file("a0000000000000000000000000000000", "", true),
        ];
        let result = reconcile(&files, &backend).await;
        assert!(result.is_empty());
        assert_eq!(result.skipped, 3);
    }

    #[tokio::test]
    async fn test_failed_probe_counts_as_missing() {
        let files = [
            file("a0000000000000000000000000000000", "mp4", true),
            file("b0000000000000000000000000000000", "mp4", false),
        ];
        let result = reconcile(&files, &FailingBackend).await;
        assert!(result.available.is_empty());
        assert_eq!(result.unavailable, BTreeSet::from(["a0000000000000000000000000000000".to_string()]));
    }
}
