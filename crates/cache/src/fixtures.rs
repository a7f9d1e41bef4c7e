//! Seed helpers for tests, here and in dependent crates (`fixtures` feature).

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::ContentKind;
use exn::ResultExt;
use sqlx::SqlitePool;

/// A content node to insert. Defaults: unavailable, not coach content, no
/// language, `content_id` equal to the node id.
#[derive(Debug, Clone)]
pub struct NewNode {
    channel_id: String,
    id: String,
    parent_id: Option<String>,
    level: u32,
    kind: ContentKind,
    content_id: Option<String>,
    lang_id: Option<String>,
    available: bool,
    coach_content: bool,
    num_coach_contents: u32,
}
impl NewNode {
    pub fn topic(channel_id: &str, id: &str, parent_id: Option<&str>, level: u32) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            level,
            kind: ContentKind::Topic,
            content_id: None,
            lang_id: None,
            available: false,
            coach_content: false,
            num_coach_contents: 0,
        }
    }

    /// A video resource; use [`kind`](Self::kind) for anything else.
    pub fn resource(channel_id: &str, id: &str, parent_id: &str, level: u32) -> Self {
        Self { kind: ContentKind::Video, ..Self::topic(channel_id, id, Some(parent_id), level) }
    }

    pub fn kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn content_id(mut self, content_id: &str) -> Self {
        self.content_id = Some(content_id.to_string());
        self
    }

    pub fn lang(mut self, lang_id: &str) -> Self {
        self.lang_id = Some(lang_id.to_string());
        self
    }

    pub fn available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn coach_content(mut self, coach_content: bool) -> Self {
        self.coach_content = coach_content;
        self
    }

    pub fn num_coach_contents(mut self, num_coach_contents: u32) -> Self {
        self.num_coach_contents = num_coach_contents;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pool: SqlitePool,
}
impl Fixture {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    /// A valid, deterministic checksum derived from an arbitrary label
    /// (hex-encoded, left-padded, truncated to 32 digits).
    pub fn checksum_for(&self, label: &str) -> String {
        let hex = label.bytes().map(|b| format!("{b:02x}")).collect::<String>();
        let hex = &hex[..hex.len().min(32)];
        format!("{hex:0>32}")
    }

    pub async fn channel(&self, id: &str, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO channels (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    pub async fn node(&self, node: NewNode) -> Result<()> {
        let content_id = node.content_id.as_deref().unwrap_or(&node.id);
        sqlx::query(
            "INSERT INTO content_nodes
                (id, channel_id, parent_id, level, kind, content_id, lang_id, available, coach_content, num_coach_contents)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&node.id)
        .bind(&node.channel_id)
        .bind(&node.parent_id)
        .bind(i64::from(node.level))
        .bind(node.kind.to_string())
        .bind(content_id)
        .bind(&node.lang_id)
        .bind(node.available)
        .bind(node.coach_content)
        .bind(i64::from(node.num_coach_contents))
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert a local file; inserting the same checksum twice is a no-op.
    pub async fn local_file(&self, checksum: &str, extension: &str, size: u64, available: bool) -> Result<()> {
        let size = i64::try_from(size).or_raise(|| ErrorKind::InvalidData("file size"))?;
        sqlx::query("INSERT OR IGNORE INTO local_files (id, extension, file_size, available) VALUES (?, ?, ?, ?)")
            .bind(checksum)
            .bind(extension)
            .bind(size)
            .bind(available)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert `count` local `.mp4` files of one byte each, with checksums
    /// `format!("{n:032x}")` for `n` in `0..count`.
    pub async fn local_file_range(&self, count: usize, available: bool) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let count = i64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))?;
        sqlx::query(
            "WITH RECURSIVE seq(n) AS (SELECT 0 UNION ALL SELECT n + 1 FROM seq WHERE n + 1 < ?)
             INSERT INTO local_files (id, extension, file_size, available)
             SELECT printf('%032x', n), 'mp4', 1, ? FROM seq",
        )
        .bind(count)
        .bind(available)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert a file row owned by `node_id`. The file starts out unavailable;
    /// its availability is projected from the local file.
    pub async fn file(&self, id: &str, node_id: &str, checksum: &str, supplementary: bool) -> Result<()> {
        sqlx::query("INSERT INTO files (id, contentnode_id, local_file_id, supplementary) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(node_id)
            .bind(checksum)
            .bind(supplementary)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_file_range() {
        let db = Database::connect_in_memory().await.unwrap();
        let fixture = Fixture::new(&db);
        fixture.local_file_range(300, true).await.unwrap();
        let (count, last): (i64, String) = sqlx::query_as("SELECT COUNT(*), MAX(id) FROM local_files")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 300);
        assert_eq!(last, format!("{:032x}", 299));
    }

    #[tokio::test]
    async fn test_checksum_for() {
        let db = Database::connect_in_memory().await.unwrap();
        let fixture = Fixture::new(&db);
        assert_eq!(fixture.checksum_for("a"), "00000000000000000000000000000061");
        assert_eq!(fixture.checksum_for("a-very-long-label-indeed").len(), 32);
    }
}
