//! Content availability annotation.
//!
//! A content node is usable only if the files behind it are physically in
//! the content store. This crate keeps that fact, and everything derived from
//! it, up to date in the catalog:
//!
//! 1. local file flags are reconciled with the content store (or set
//!    directly by a caller that knows better),
//! 2. file and resource availability are projected from the local files,
//! 3. topics are annotated level by level from the deepest one up,
//! 4. channel statistics are recalculated,
//! 5. the content cache key is bumped.
//!
//! ```no_run
//! use canopy_annotate::Annotator;
//! use canopy_config::Config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let annotator = Annotator::from_config(&config).await?;
//! let summary = annotator.annotate_content("95a52b386f2c485cb97dd60901674a98", None).await?;
//! println!("{} resources available", summary.channel.total_resource_count);
//! # Ok(())
//! # }
//! ```

mod annotator;
pub mod error;
mod reconcile;

pub use crate::annotator::{Annotator, Summary};
pub use crate::reconcile::Reconciliation;
