//! Tile codec.
//!
//! This module wraps the `image` crate for the two tile formats the builder
//! can produce, and for decoding tiles (and the source image) back into RGBA
//! pixel buffers.
//!
//! # Design Decisions
//!
//! - **RGBA everywhere**: all canvases are `RgbaImage`. Regions no upper tile
//!   contributed to stay fully transparent.
//!
//! - **JPEG drops alpha**: JPEG has no alpha channel, so canvases are flattened
//!   to RGB before encoding. Transparent regions come out black.
//!
//! - **Fixed parameters**: PNG uses the encoder defaults and JPEG uses quality
//!   95. Neither is configurable.
//!
//! - **Uncapped source decode**: tiles are decoded under the `image` crate's
//!   default allocation limit, the source image is not.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use clap::ValueEnum;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Limits, RgbaImage};
use serde::Serialize;

use crate::error::CodecError;

/// JPEG quality used for every `.jpg` tile.
pub const JPEG_QUALITY: u8 = 95;

// =============================================================================
// Tile Format
// =============================================================================

/// Output encoding of tile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TileFormat {
    /// Lossless PNG tiles (`.png`).
    #[value(name = "png")]
    Png,

    /// JPEG tiles at quality 95 (`.jpg`).
    #[default]
    #[value(name = "jpg", alias = "jpeg")]
    #[serde(rename = "jpg")]
    Jpeg,
}

impl TileFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpeg => "jpg",
        }
    }

    /// Value of the manifest's `Format` attribute.
    pub fn manifest_name(&self) -> &'static str {
        self.extension()
    }
}

impl std::fmt::Display for TileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

// =============================================================================
// Tile Codec
// =============================================================================

/// Encodes canvases into tile bytes and decodes tile files into canvases.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileCodec {
    format: TileFormat,
}

impl TileCodec {
    pub fn new(format: TileFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Encode an RGBA canvas in this codec's format.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the canvas is empty or the encoder
    /// fails.
    pub fn encode(&self, canvas: &RgbaImage) -> Result<Bytes, CodecError> {
        let (width, height) = canvas.dimensions();
        if width == 0 || height == 0 {
            return Err(CodecError::Encode {
                message: format!("cannot encode empty {}x{} canvas", width, height),
            });
        }

        let mut output = Vec::new();
        let encode_err = |e: image::ImageError| CodecError::Encode {
            message: e.to_string(),
        };

        match self.format {
            TileFormat::Png => {
                PngEncoder::new(&mut output)
                    .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(encode_err)?;
            }
            TileFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(canvas.clone()).into_rgb8();
                JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY)
                    .encode_image(&rgb)
                    .map_err(encode_err)?;
            }
        }

        Ok(Bytes::from(output))
    }

    /// Decode a tile file into an RGBA canvas.
    ///
    /// The format is detected from the file contents, not the extension.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the file is missing, unreadable or
    /// not a valid image.
    pub fn decode_file(&self, path: &Path) -> Result<RgbaImage, CodecError> {
        decode_file(path)
    }
}

/// Decode an image file (PNG or JPEG) into RGBA pixels.
pub fn decode_file(path: &Path) -> Result<RgbaImage, CodecError> {
    decode_with_limits(path, Limits::default())
}

/// Decode the full-resolution source image into RGBA pixels.
///
/// No allocation cap is applied, so sources past the `image` crate's
/// 512 MiB default still decode.
pub fn decode_source(path: &Path) -> Result<RgbaImage, CodecError> {
    decode_with_limits(path, Limits::no_limits())
}

fn decode_with_limits(path: &Path, limits: Limits) -> Result<RgbaImage, CodecError> {
    let decode_err = |message: String| CodecError::Decode {
        message: format!("{}: {}", path.display(), message),
    };

    let mut reader = ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?;
    reader.limits(limits);

    let img = reader.decode().map_err(|e| decode_err(e.to_string()))?;
    Ok(img.into_rgba8())
}

/// Decode in-memory image bytes (PNG or JPEG) into RGBA pixels.
pub fn decode_bytes(data: &[u8]) -> Result<RgbaImage, CodecError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode {
            message: e.to_string(),
        })?;

    let img = reader.decode().map_err(|e| CodecError::Decode {
        message: e.to_string(),
    })?;

    Ok(img.into_rgba8())
}

// =============================================================================
// Tests
// =============================================================================
