//! Content storage layout and path validation.
//!
//! Blobs live under `storage/` in the content root, fanned out by the first
//! two characters of their checksum:
//!
//! ```text
//! storage/
//! └── 6/
//!     └── f/
//!         └── 6f1b17063da8508541eb76dac260748a.mp4
//! ```

use crate::error::{ErrorKind, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Directory (relative to the content root) that holds every blob.
const STORAGE_DIR: &str = "storage";

static VALID_STORAGE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    // Hard-coded pattern, compiling it cannot fail.
    Regex::new(r"^[0-9a-f]{32}(-data)?\.[0-9a-z]+$").unwrap()
});

/// Filename of a blob in the content store.
///
/// ```
/// use canopy_storage::content_file_name;
/// assert_eq!(content_file_name("6f1b17063da8508541eb76dac260748a", "mp4"), "6f1b17063da8508541eb76dac260748a.mp4");
/// ```
pub fn content_file_name(checksum: &str, extension: &str) -> String {
    format!("{checksum}.{extension}")
}

/// Resolve the path of a blob, relative to the content root.
///
/// Returns [`InvalidFilename`](crate::error::ErrorKind::InvalidFilename) when
/// the checksum and extension cannot form a valid storage filename (wrong
/// checksum length, uppercase hex, empty or punctuated extension...).
///
/// ```
/// use std::path::Path;
/// use canopy_storage::content_path;
/// assert_eq!(
///     content_path("6f1b17063da8508541eb76dac260748a", "mp4").unwrap(),
///     Path::new("storage/6/f/6f1b17063da8508541eb76dac260748a.mp4"),
/// );
/// assert!(content_path("not-a-checksum", "mp4").is_err());
/// ```
pub fn content_path(checksum: &str, extension: &str) -> Result<PathBuf> {
    let filename = content_file_name(checksum, extension);
    if !VALID_STORAGE_FILENAME.is_match(&filename) {
        exn::bail!(ErrorKind::InvalidFilename(filename));
    }
    // The pattern guarantees the first two bytes are ASCII hex digits.
    let (first, second) = (&filename[0..1], &filename[1..2]);
    Ok(Path::new(STORAGE_DIR).join(first).join(second).join(&filename))
}

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// ```
/// use std::path::Path;
/// use canopy_storage::validate_path;
/// assert!(validate_path("storage/6/f/6f1b.mp4").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert_eq!(validate_path("storage//./a/../b.mp4/").unwrap(), Path::new("storage/b.mp4"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls; reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}
