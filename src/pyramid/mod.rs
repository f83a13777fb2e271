//! Pyramid construction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             PyramidBuilder              │
//! │  (levels in order, manifest last)       │
//! └──────────┬──────────────────┬───────────┘
//!            │                  │
//!            ▼                  ▼
//! ┌───────────────────┐ ┌──────────────────────┐
//! │   Top-level       │ │   Level compositor   │
//! │   slicer          │ │   (per lower level)  │
//! │   source → tiles  │ │   tiles → tiles      │
//! └─────────┬─────────┘ └──────────┬───────────┘
//!           │                      │
//!           ▼                      ▼
//! ┌─────────────────────────────────────────┐
//! │   TileWriter (codec + layout)           │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PyramidBuilder`]: entry point, returns a [`BuildReport`]
//! - [`extract_tile`]: cuts one tile rectangle out of the source
//! - [`Mosaic`] / [`downsample_half`]: 2x box-filter compositing
//! - [`TileWriter`]: encodes and persists tiles
//! - [`CancelFlag`], [`LevelProgress`], [`BuildWarnings`]: shared build state

mod builder;
mod compositor;
mod progress;
mod slicer;
mod worker;
mod writer;

use std::sync::Arc;

pub use builder::{BuildReport, LevelReport, PyramidBuilder};
pub use compositor::{downsample_half, Mosaic};
pub use progress::{BuildWarnings, CancelFlag, LevelProgress};
pub use slicer::extract_tile;
pub use writer::TileWriter;

/// Shared state handed to every row job of one level.
#[derive(Debug, Clone)]
pub(crate) struct LevelContext {
    pub(crate) writer: Arc<TileWriter>,
    pub(crate) progress: Arc<LevelProgress>,
    pub(crate) cancel: CancelFlag,
    pub(crate) warnings: Arc<BuildWarnings>,
}
