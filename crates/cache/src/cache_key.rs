//! Version token for downstream content caches.
//!
//! Anything that caches views of the catalog keys them on this value; bumping
//! it after the annotations change invalidates every such cache at once.

use crate::Database;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

#[derive(Debug, Clone)]
pub struct CacheKey {
    pool: SqlitePool,
}
impl From<&Database> for CacheKey {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl CacheKey {
    pub async fn current(&self) -> Result<i64> {
        sqlx::query_scalar(include_str!("../queries/get_cache_key.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Advance the token and return its new value: the current time in Unix
    /// milliseconds, or one more than the previous value if the clock hasn't
    /// moved past it.
    pub async fn bump(&self) -> Result<i64> {
        let now = UtcDateTime::now().unix_timestamp_nanos() / 1_000_000;
        let now = i64::try_from(now).or_raise(|| ErrorKind::InvalidData("timestamp"))?;
        let version: i64 = sqlx::query_scalar(include_str!("../queries/bump_cache_key.sql"))
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::debug!(version, "Bumped content cache key");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bump_is_monotonic() {
        let db = Database::connect_in_memory().await.unwrap();
        let key = CacheKey::from(&db);
        assert_eq!(key.current().await.unwrap(), 0);
        let first = key.bump().await.unwrap();
        let second = key.bump().await.unwrap();
        let third = key.bump().await.unwrap();
        assert!(first > 0);
        assert!(second > first);
        assert!(third > second);
        assert_eq!(key.current().await.unwrap(), third);
    }

    #[tokio::test]
    async fn test_bump_past_the_clock() {
        let db = Database::connect_in_memory().await.unwrap();
        let future = i64::MAX / 2;
        sqlx::query("UPDATE content_cache_key SET version = ?").bind(future).execute(db.pool()).await.unwrap();
        let key = CacheKey::from(&db);
        assert_eq!(key.bump().await.unwrap(), future + 1);
    }
}
