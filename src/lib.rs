//! # Deep Zoom Builder
//!
//! Converts a single large raster image into a Deep Zoom (DZI) tile pyramid:
//! a directory of overlapping 256px tiles at every power-of-two resolution,
//! plus the XML manifest viewers such as OpenSeadragon read.
//!
//! ## Features
//!
//! - **Seam-free tiling**: 1 px overlap on interior edges, clipped at image bounds
//! - **Derived levels**: each level is built from the persisted tiles of the level above
//! - **PNG or JPEG output**: lossless PNG or JPEG at quality 95
//! - **Parallel within a level**: rows of tiles are processed concurrently
//! - **Cancellable**: stops between tiles and never writes a manifest for a partial pyramid
//!
//! ## Architecture
//!
//! - [`geometry`] - Pure level/tile arithmetic
//! - [`tile`] - Tile addressing, on-disk layout and PNG/JPEG codec
//! - [`pyramid`] - Top-level slicer, level compositor and build orchestration
//! - [`manifest`] - DZI XML descriptor
//! - [`config`] - CLI and build configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use deepzoom_builder::{BuildConfig, PyramidBuilder, TileFormat};
//!
//! #[tokio::main]
//! async fn main() {
//!     let builder = PyramidBuilder::new(BuildConfig::new(TileFormat::Jpeg));
//!
//!     // Writes out/photo.dzi and out/photo_files/{level}/{col}_{row}.jpg
//!     let report = builder.build("photo.jpg", "out/photo.dzi").await.unwrap();
//!     println!("max level {}", report.max_level);
//! }
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod manifest;
pub mod pyramid;
pub mod tile;

// Re-export commonly used types
pub use config::{default_workers, BuildConfig, Cli};
pub use error::{BuildError, CodecError, GeometryError};
pub use geometry::{
    level_bounds, level_scale_factor, max_level, tile_grid, tile_source_rect, LevelGeometry,
    PyramidGeometry, Rect, TILE_OVERLAP, TILE_SIZE,
};
pub use manifest::Manifest;
pub use pyramid::{
    downsample_half, extract_tile, BuildReport, BuildWarnings, CancelFlag, LevelProgress,
    LevelReport, Mosaic, PyramidBuilder, TileWriter,
};
pub use tile::{
    decode_bytes, decode_file, decode_source, parse_tile_file_name, PyramidLayout, TileAddress,
    TileCodec, TileFormat, JPEG_QUALITY,
};
