//! SQLite content catalog and the bulk statements that annotate it.
//!
//! The catalog holds channels, their content trees, the files owned by each
//! content node and the physical blobs (local files) those files point to.
//! Rows are created elsewhere; this crate only rewrites the derived columns:
//!
//! - local file availability ([`LocalFileRepository`]), in bounded batches,
//! - file and leaf availability, then the topic aggregates, level by level
//!   ([`TreeRepository`]),
//! - channel statistics ([`ChannelRepository`]),
//! - the content cache version token ([`CacheKey`]).
//!
//! Every operation is a fixed number of set-based statements, each run inside
//! a transaction, so an interrupted call leaves the previous values intact and
//! can simply be repeated.

mod cache_key;
mod db;
pub mod dialect;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod models;
mod repo;

pub use crate::cache_key::CacheKey;
pub use crate::db::Database;
pub use crate::models::{Channel, ContentKind, ContentNode, LocalFile};
pub use crate::repo::{CHUNK_SIZE, ChannelRepository, LeafProjection, LocalFileRepository, TreeRepository};
