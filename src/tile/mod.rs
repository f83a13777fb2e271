//! Tile files.
//!
//! This module covers everything about a single tile on disk: how it is
//! addressed, where it lives, and how its pixels are encoded.
//!
//! # Components
//!
//! - [`TileAddress`]: `(level, col, row)` identifying one tile file
//! - [`PyramidLayout`]: manifest path and `name_files/{level}/{col}_{row}.{ext}` paths
//! - [`TileFormat`]: PNG or JPEG output
//! - [`TileCodec`]: encodes RGBA canvases and decodes tile files
//!
//! # Example
//!
//! ```
//! use deepzoom_builder::tile::{PyramidLayout, TileAddress, TileFormat};
//!
//! let layout = PyramidLayout::from_destination("out/photo.dzi").unwrap();
//! let path = layout.tile_path(TileAddress::new(9, 1, 0), TileFormat::Jpeg);
//!
//! assert!(path.ends_with("photo_files/9/1_0.jpg"));
//! ```

mod codec;
mod layout;

pub use codec::{decode_bytes, decode_file, decode_source, TileCodec, TileFormat, JPEG_QUALITY};
pub use layout::{parse_tile_file_name, PyramidLayout, TileAddress, MANIFEST_EXTENSIONS};
