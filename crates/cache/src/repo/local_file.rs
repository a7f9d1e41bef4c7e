//! Repository for [`LocalFile`] availability.
//!
//! Checksum lists handed to this repository can be arbitrarily large (a full
//! catalog re-scan), so every statement that binds checksums is issued in
//! chunks of at most [`batch_size`](LocalFileRepository::with_batch_size).

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{LocalFile, LocalFileRow};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeSet;
use tracing::instrument;

/// Default number of checksums bound per statement.
pub const CHUNK_SIZE: usize = 10_000;

/// Collapse duplicates and give the chunks a deterministic order.
fn unique(checksums: &[String]) -> Vec<&str> {
    checksums.iter().map(String::as_str).collect::<BTreeSet<_>>().into_iter().collect()
}

#[derive(Debug, Clone)]
pub struct LocalFileRepository {
    pool: SqlitePool,
    batch_size: usize,
}
impl From<&Database> for LocalFileRepository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), batch_size: CHUNK_SIZE }
    }
}
impl LocalFileRepository {
    /// Change the number of checksums bound per statement (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    // =========================================================================
    // Get/List
    // =========================================================================

    /// Get a single local file by checksum.
    pub async fn get(&self, checksum: impl AsRef<str>) -> Result<Option<LocalFile>> {
        let row: Option<LocalFileRow> = sqlx::query_as(include_str!("../../queries/get_local_file.sql"))
            .bind(checksum.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(LocalFile::try_from).transpose()
    }

    /// List local files: every known blob when `checksums` is `None`,
    /// otherwise only those whose checksum is listed. Unknown checksums are
    /// ignored. Results are ordered by checksum.
    pub async fn list(&self, checksums: Option<&[String]>) -> Result<Vec<LocalFile>> {
        let Some(checksums) = checksums else {
            let rows: Vec<LocalFileRow> = sqlx::query_as(include_str!("../../queries/list_local_files.sql"))
                .fetch_all(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
            return rows.into_iter().map(LocalFile::try_from).collect();
        };
        let mut files = Vec::with_capacity(checksums.len());
        for chunk in unique(checksums).chunks(self.batch_size) {
            let mut query = QueryBuilder::<Sqlite>::new("SELECT id, extension, file_size, available FROM local_files");
            query.push(" WHERE id IN (");
            let mut separated = query.separated(", ");
            for checksum in chunk {
                separated.push_bind(*checksum);
            }
            separated.push_unseparated(") ORDER BY id");
            let rows: Vec<LocalFileRow> =
                query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            for row in rows {
                files.push(LocalFile::try_from(row)?);
            }
        }
        Ok(files)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Set the availability flag of exactly the given local files.
    ///
    /// Statements are issued in chunks of the configured batch size, but all
    /// chunks belong to one transaction: either every listed file is updated
    /// or none is. Empty input is a no-op. Returns the number of rows changed
    /// (unknown checksums don't count).
    #[instrument(skip(self, checksums), fields(count = checksums.len()))]
    pub async fn set_availability(&self, checksums: &[String], available: bool) -> Result<u64> {
        if checksums.is_empty() {
            return Ok(0);
        }
        tracing::info!(count = checksums.len(), available, "Setting availability of local files");
        let mut updated = 0;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for chunk in unique(checksums).chunks(self.batch_size) {
            let mut query = QueryBuilder::<Sqlite>::new("UPDATE local_files SET available = ");
            query.push_bind(available);
            query.push(" WHERE id IN (");
            let mut separated = query.separated(", ");
            for checksum in chunk {
                separated.push_bind(*checksum);
            }
            separated.push_unseparated(")");
            let result = query.build().execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
            updated += result.rows_affected();
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;

    fn checksum(n: usize) -> String {
        format!("{n:032x}")
    }

    async fn setup(count: usize, available: bool) -> (Database, LocalFileRepository) {
        let db = Database::connect_in_memory().await.unwrap();
        let fixture = Fixture::new(&db);
        fixture.local_file_range(count, available).await.unwrap();
        let repo = LocalFileRepository::from(&db);
        (db, repo)
    }

    async fn count_available(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM local_files WHERE available = 1")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_input_is_noop() {
        let (db, repo) = setup(3, false).await;
        assert_eq!(repo.set_availability(&[], true).await.unwrap(), 0);
        assert_eq!(count_available(&db).await, 0);
    }

    #[tokio::test]
    async fn test_set_availability_only_touches_listed() {
        let (db, repo) = setup(5, false).await;
        let updated = repo.set_availability(&[checksum(1), checksum(3)], true).await.unwrap();
        assert_eq!(updated, 2);
        assert!(repo.get(checksum(1)).await.unwrap().unwrap().available);
        assert!(!repo.get(checksum(2)).await.unwrap().unwrap().available);
        assert!(repo.get(checksum(3)).await.unwrap().unwrap().available);
        assert_eq!(count_available(&db).await, 2);
        repo.set_availability(&[checksum(3)], false).await.unwrap();
        assert_eq!(count_available(&db).await, 1);
    }

    #[tokio::test]
    async fn test_duplicates_and_unknown_checksums() {
        let (_db, repo) = setup(2, false).await;
        let input = vec![checksum(0), checksum(0), checksum(99)];
        assert_eq!(repo.set_availability(&input, true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_boundary() {
        let (db, repo) = setup(25_000, false).await;
        let checksums = (0..25_000).map(checksum).collect::<Vec<_>>();
        let updated = repo.set_availability(&checksums, true).await.unwrap();
        assert_eq!(updated, 25_000);
        assert_eq!(count_available(&db).await, 25_000);
    }

    #[tokio::test]
    async fn test_batch_failure_rolls_back_every_chunk() {
        let (db, repo) = setup(25_000, false).await;
        // Checksums are chunked in sorted order, so the last one lands in the
        // third chunk, after two chunks have already been written.
        sqlx::query(&format!(
            "CREATE TRIGGER fail_third_chunk BEFORE UPDATE ON local_files WHEN NEW.id = '{}'
             BEGIN SELECT RAISE(ABORT, 'simulated failure'); END",
            checksum(24_999)
        ))
        .execute(db.pool())
        .await
        .unwrap();
        let checksums = (0..25_000).map(checksum).collect::<Vec<_>>();
        let err = repo.set_availability(&checksums, true).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Database);
        assert_eq!(count_available(&db).await, 0);
    }

    #[tokio::test]
    async fn test_list_all_and_selected() {
        let (_db, repo) = setup(4, true).await;
        assert_eq!(repo.list(None).await.unwrap().len(), 4);
        let selected = repo.with_batch_size(1).list(Some(&[checksum(2), checksum(0), checksum(42)])).await.unwrap();
        let checksums = selected.iter().map(|f| f.checksum.clone()).collect::<Vec<_>>();
        assert_eq!(checksums, vec![checksum(0), checksum(2)]);
    }

    #[tokio::test]
    async fn test_batch_size_minimum() {
        let (_db, repo) = setup(0, false).await;
        assert_eq!(repo.batch_size(), CHUNK_SIZE);
        assert_eq!(repo.with_batch_size(0).batch_size(), 1);
    }
}
