//! Bulk annotation of a channel's content tree.
//!
//! Nothing here visits nodes one by one: every step is a set-based `UPDATE`
//! scoped to one channel (and, for the upward pass, to one tree level), so
//! the cost is a fixed number of statements per tree level regardless of how
//! many nodes the channel holds.

use crate::Database;
use crate::dialect::Dialect;
use crate::error::{ErrorKind, Result};
use crate::models::{ContentNode, ContentNodeRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::instrument;

/// Number of rows touched by [`TreeRepository::project_leaves`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafProjection {
    /// File rows (across every channel) whose availability was re-projected.
    pub files: u64,
    /// Resource nodes of the channel whose availability was recomputed.
    pub nodes: u64,
}

/// Render the statement that annotates the topics of one level from their
/// already-annotated children. Binds: the topics' level, then the channel id.
///
/// Topics without a single available child are left untouched: they keep the
/// `available = false` set by the pre-pass, and their `coach_content` is
/// meaningless while they're unavailable.
fn level_statement(dialect: Dialect) -> String {
    let yes = dialect.boolean(true);
    let available_children = format!(
        "FROM content_nodes AS child \
         WHERE child.available = {yes} \
           AND child.parent_id = content_nodes.id \
           AND child.channel_id = content_nodes.channel_id"
    );
    format!(
        "UPDATE content_nodes SET \
             available = {yes}, \
             coach_content = (SELECT {and} {available_children}), \
             num_coach_contents = (SELECT SUM(child.num_coach_contents) {available_children}) \
         WHERE level = {level} \
           AND channel_id = {channel} \
           AND kind = 'topic' \
           AND EXISTS (SELECT 1 {available_children})",
        and = dialect.bool_and("child.coach_content"),
        level = dialect.placeholder(1),
        channel = dialect.placeholder(2),
    )
}

#[derive(Debug, Clone)]
pub struct TreeRepository {
    pool: SqlitePool,
    level_statement: String,
}
impl From<&Database> for TreeRepository {
    fn from(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            level_statement: level_statement(db.dialect()),
        }
    }
}
impl TreeRepository {
    // =========================================================================
    // Leaves
    // =========================================================================

    /// Project blob availability onto files, then file availability onto the
    /// channel's resource nodes.
    ///
    /// 1. Every file (in every channel) copies the availability of the local
    ///    file it references.
    /// 2. Every non-topic node of the channel is available iff it owns at
    ///    least one available, non-supplementary file.
    ///
    /// Both steps commit together.
    #[instrument(skip(self))]
    pub async fn project_leaves(&self, channel_id: &str) -> Result<LeafProjection> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!("Setting availability of files based on local file availability");
        let files = sqlx::query(include_str!("../../queries/project_file_availability.sql"))
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        tracing::info!("Setting availability of non-topic content nodes based on file availability");
        let nodes = sqlx::query(include_str!("../../queries/project_leaf_availability.sql"))
            .bind(channel_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(LeafProjection { files, nodes })
    }

    // =========================================================================
    // Topics
    // =========================================================================

    /// Annotate every topic of the channel from the bottom of the tree up.
    ///
    /// Resource nodes get `num_coach_contents` re-derived from their own
    /// `coach_content` flag and every topic starts out unavailable. Then, for
    /// each level from the deepest to the first, topics one level above get:
    ///
    /// - `available`: whether any child is available,
    /// - `coach_content`: whether every available child is coach content,
    /// - `num_coach_contents`: sum over the available children.
    ///
    /// The whole pass is a single transaction; concurrent readers only ever
    /// see the previous or the fully recomputed tree. Returns the number of
    /// levels processed (zero for an empty channel).
    #[instrument(skip(self))]
    pub async fn aggregate(&self, channel_id: &str) -> Result<u32> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let depth: Option<i64> = sqlx::query_scalar(include_str!("../../queries/max_level.sql"))
            .bind(channel_id)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(depth) = depth else {
            tracing::info!("Channel has no content nodes; nothing to annotate");
            return Ok(0);
        };
        let depth = u32::try_from(depth).or_raise(|| ErrorKind::InvalidData("level"))?;
        tracing::info!(levels = depth, "Annotating content nodes with children");

        sqlx::query(include_str!("../../queries/reset_leaf_coach_counts.sql"))
            .bind(channel_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../../queries/reset_topic_availability.sql"))
            .bind(channel_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;

        // Each level reads the rows written by the level below it, so the
        // order matters: deepest first.
        for level in (1..=depth).rev() {
            let result = sqlx::query(&self.level_statement)
                .bind(i64::from(level - 1))
                .bind(channel_id)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            tracing::info!(level, topics = result.rows_affected(), "Annotated content nodes with children for level");
        }

        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(elapsed = ?started.elapsed(), "Recursive topic tree annotation finished");
        Ok(depth)
    }

    // =========================================================================
    // Get/List
    // =========================================================================

    pub async fn get_node(&self, id: impl AsRef<str>) -> Result<Option<ContentNode>> {
        let row: Option<ContentNodeRow> = sqlx::query_as(include_str!("../../queries/get_node.sql"))
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(ContentNode::try_from).transpose()
    }

    /// List every node of a channel, shallowest level first.
    pub async fn list_nodes(&self, channel_id: impl AsRef<str>) -> Result<Vec<ContentNode>> {
        let rows: Vec<ContentNodeRow> = sqlx::query_as(include_str!("../../queries/list_nodes_for_channel.sql"))
            .bind(channel_id.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(ContentNode::try_from).collect()
    }
}
