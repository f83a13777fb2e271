//! Tile persistence.

use std::path::PathBuf;

use image::RgbaImage;
use tracing::debug;

use crate::error::BuildError;
use crate::tile::{PyramidLayout, TileAddress, TileCodec, TileFormat};

/// Encodes canvases and writes them to their tile paths.
///
/// Each tile owns a unique path, so a single writer can be shared by every
/// worker of a level without locking. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct TileWriter {
    layout: PyramidLayout,
    codec: TileCodec,
}

impl TileWriter {
    pub fn new(layout: PyramidLayout, format: TileFormat) -> Self {
        Self {
            layout,
            codec: TileCodec::new(format),
        }
    }

    pub fn layout(&self) -> &PyramidLayout {
        &self.layout
    }

    pub fn codec(&self) -> &TileCodec {
        &self.codec
    }

    pub fn format(&self) -> TileFormat {
        self.codec.format()
    }

    pub fn tile_path(&self, address: TileAddress) -> PathBuf {
        self.layout.tile_path(address, self.codec.format())
    }

    /// Encode `canvas` and write it as tile `address`.
    ///
    /// The level directory must already exist.
    pub fn write(&self, address: TileAddress, canvas: &RgbaImage) -> Result<PathBuf, BuildError> {
        let data = self
            .codec
            .encode(canvas)
            .map_err(|source| BuildError::TileEncode { address, source })?;

        let path = self.tile_path(address);
        std::fs::write(&path, &data).map_err(|e| BuildError::io(&path, e))?;

        debug!(
            "Wrote {} ({}x{}, {} bytes)",
            address,
            canvas.width(),
            canvas.height(),
            data.len()
        );
        Ok(path)
    }
}
