use crate::error::{Error, ErrorKind};
use exn::ResultExt;

/// A physical blob in the content store, addressed by its checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub checksum: String,
    pub extension: String,
    /// Size in bytes
    pub file_size: u64,
    /// Whether the blob was last known to be present on disk.
    pub available: bool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct LocalFileRow {
    id: String,
    extension: String,
    file_size: i64,
    available: bool,
}
impl TryFrom<LocalFileRow> for LocalFile {
    type Error = Error;
    fn try_from(row: LocalFileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            checksum: row.id,
            extension: row.extension,
            file_size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            available: row.available,
        })
    }
}
