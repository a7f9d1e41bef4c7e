use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Channel, ChannelRow};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}
impl From<&Database> for ChannelRepository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl ChannelRepository {
    pub async fn get(&self, id: impl AsRef<str>) -> Result<Option<Channel>> {
        let id = id.as_ref();
        let row: Option<ChannelRow> = sqlx::query_as(include_str!("../../queries/get_channel.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let languages: Vec<String> = sqlx::query_scalar(include_str!("../../queries/list_channel_languages.sql"))
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.into_model(languages.into_iter().collect::<BTreeSet<_>>()).map(Some)
    }

    /// Recompute the channel's derived fields from its (already annotated)
    /// content tree, and return the updated channel.
    ///
    /// - `published_size`: total size of the distinct blobs behind the
    ///   channel's available files, supplementary files included.
    /// - `total_resource_count`: available resources, counted once per
    ///   `content_id`.
    /// - `included_languages`: gains the languages of available nodes. It is
    ///   never shrunk.
    /// - `order`: one more than the highest order of any channel. Reassigned
    ///   on every call.
    #[instrument(skip(self))]
    pub async fn calculate_fields(&self, id: &str) -> Result<Channel> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM channels WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if exists.is_none() {
            exn::bail!(ErrorKind::ChannelNotFound(id.to_string()));
        }
        tracing::info!("Calculating channel fields");
        for statement in [
            include_str!("../../queries/update_published_size.sql"),
            include_str!("../../queries/update_total_resource_count.sql"),
            include_str!("../../queries/insert_included_languages.sql"),
            include_str!("../../queries/update_next_order.sql"),
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        self.get(id).await?.ok_or_raise(|| ErrorKind::ChannelNotFound(id.to_string()))
    }
}
