use crate::error::{ErrorKind, Result};
use crate::reconcile::{Reconciliation, reconcile};
use canopy_cache::{
    CacheKey, Channel, ChannelRepository, Database, LeafProjection, LocalFileRepository, TreeRepository,
};
use canopy_config::Config;
use canopy_storage::BackendHandle;
use canopy_storage::backend::LocalBackend;
use exn::ResultExt;
use std::sync::Arc;
use tracing::instrument;

/// Outcome of a full metadata update of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub leaves: LeafProjection,
    /// Tree levels aggregated (the depth of the channel's tree).
    pub levels: u32,
    pub channel: Channel,
    /// Content cache key after the update.
    pub cache_key: i64,
}

/// Keeps the derived availability metadata of a content catalog in line with
/// what is actually present in the content store.
#[derive(Clone)]
pub struct Annotator {
    backend: BackendHandle,
    local_files: LocalFileRepository,
    tree: TreeRepository,
    channels: ChannelRepository,
    cache_key: CacheKey,
}

impl Annotator {
    pub fn new(db: &Database, backend: BackendHandle) -> Self {
        Self {
            backend,
            local_files: LocalFileRepository::from(db),
            tree: TreeRepository::from(db),
            channels: ChannelRepository::from(db),
            cache_key: CacheKey::from(db),
        }
    }

    /// Connect to the configured catalog and local content store.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate().or_raise(|| ErrorKind::Config)?;
        let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Cache)?;
        let backend = LocalBackend::new("local", &config.content.root).or_raise(|| ErrorKind::Storage)?;
        Ok(Self::new(&db, Arc::new(backend)).with_batch_size(config.batch_size))
    }

    /// Number of checksums bound per statement when updating local files.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.local_files = self.local_files.with_batch_size(batch_size);
        self
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }

    // =========================================================================
    // Local files
    // =========================================================================

    /// Flag local files as present, without checking the content store (for
    /// example right after they were downloaded). Returns the number of local
    /// files updated.
    pub async fn mark_available(&self, checksums: &[String]) -> Result<u64> {
        self.local_files.set_availability(checksums, true).await.or_raise(|| ErrorKind::Cache)
    }

    pub async fn mark_unavailable(&self, checksums: &[String]) -> Result<u64> {
        self.local_files.set_availability(checksums, false).await.or_raise(|| ErrorKind::Cache)
    }

    /// Re-check local files against the content store and correct the flags
    /// of those that disagree. `None` checks every known local file; unknown
    /// checksums are ignored.
    #[instrument(skip_all, fields(backend = self.backend.name()))]
    pub async fn reconcile_from_disk(&self, checksums: Option<&[String]>) -> Result<Reconciliation> {
        match checksums {
            None => tracing::info!("Setting availability of local files based on disk availability"),
            Some(checksums) => tracing::info!(
                count = checksums.len(),
                "Setting availability of selected local files based on disk availability"
            ),
        }
        let files = self.local_files.list(checksums).await.or_raise(|| ErrorKind::Cache)?;
        let result = reconcile(&files, self.backend.as_ref()).await;
        tracing::info!(
            checked = files.len(),
            available = result.available.len(),
            unavailable = result.unavailable.len(),
            skipped = result.skipped,
            "Reconciled local files",
        );
        let available = result.available.iter().cloned().collect::<Vec<_>>();
        let unavailable = result.unavailable.iter().cloned().collect::<Vec<_>>();
        self.mark_available(&available).await?;
        self.mark_unavailable(&unavailable).await?;
        Ok(result)
    }

    // =========================================================================
    // Channel metadata
    // =========================================================================

    /// Project local file availability onto the channel's files and
    /// resources.
    pub async fn set_leaf_availability(&self, channel_id: &str) -> Result<LeafProjection> {
        self.tree.project_leaves(channel_id).await.or_raise(|| ErrorKind::Cache)
    }

    /// Re-derive every topic's availability and coach content aggregates from
    /// its resources. Returns the number of tree levels processed.
    pub async fn recurse_availability_up_tree(&self, channel_id: &str) -> Result<u32> {
        self.tree.aggregate(channel_id).await.or_raise(|| ErrorKind::Cache)
    }

    pub async fn calculate_channel_fields(&self, channel_id: &str) -> Result<Channel> {
        self.channels.calculate_fields(channel_id).await.or_raise(|| ErrorKind::Cache)
    }

    /// Recompute everything derived from local file availability for one
    /// channel, then invalidate downstream content caches.
    #[instrument(skip(self))]
    pub async fn update_content_metadata(&self, channel_id: &str) -> Result<Summary> {
        let exists = self.channels.get(channel_id).await.or_raise(|| ErrorKind::Cache)?;
        if exists.is_none() {
            exn::bail!(ErrorKind::ChannelNotFound(channel_id.to_string()));
        }
        let leaves = self.set_leaf_availability(channel_id).await?;
        let levels = self.recurse_availability_up_tree(channel_id).await?;
        let channel = self.calculate_channel_fields(channel_id).await?;
        let cache_key = self.cache_key.bump().await.or_raise(|| ErrorKind::Cache)?;
        tracing::info!(
            resources = leaves.nodes,
            levels,
            published_size = channel.published_size,
            total_resource_count = channel.total_resource_count,
            "Updated content metadata",
        );
        Ok(Summary { leaves, levels, channel, cache_key })
    }

    /// Bring local file availability up to date, then update the channel's
    /// metadata.
    ///
    /// Without `checksums`, every local file is re-checked against the content
    /// store. With `checksums`, the listed local files are trusted to be
    /// present and flagged available without touching the store.
    pub async fn annotate_content(&self, channel_id: &str, checksums: Option<&[String]>) -> Result<Summary> {
        match checksums {
            None => {
                self.reconcile_from_disk(None).await?;
            },
            Some(checksums) => {
                self.mark_available(checksums).await?;
            },
        }
        self.update_content_metadata(channel_id).await
    }
}
