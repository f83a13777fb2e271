use thiserror::Error;

use crate::tile::TileAddress;

/// Errors from the pure geometry layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Source image has a zero dimension
    #[error("Invalid image dimensions: {width}x{height} (both must be greater than 0)")]
    InvalidDimension { width: u32, height: u32 },

    /// Tile size is zero or the overlap does not fit inside a tile
    #[error("Invalid tiling: {tile_size}px tiles with {overlap}px overlap")]
    InvalidTiling { tile_size: u32, overlap: u32 },
}

/// Errors from encoding or decoding a single image
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// File is absent, unreadable or not a valid PNG/JPEG
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Encoder rejected the pixel buffer
    #[error("Failed to encode image: {message}")]
    Encode { message: String },
}

/// Errors that abort a pyramid build
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Source dimensions or tiling cannot form a pyramid
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// The source image could not be read
    #[error("Failed to decode source image {path}: {source}")]
    SourceDecode { path: String, source: CodecError },

    /// A tile could not be encoded
    #[error("Failed to encode tile {address}: {source}")]
    TileEncode {
        address: TileAddress,
        source: CodecError,
    },

    /// Directory or tile file could not be created
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// The manifest document could not be written
    #[error("Failed to write manifest {path}: {message}")]
    ManifestWrite { path: String, message: String },

    /// Destination path is not a `.dzi` or `.xml` file
    #[error("Invalid destination {path}: {reason}")]
    InvalidDestination { path: String, reason: String },

    /// The build was cancelled between tiles
    #[error("Build cancelled while processing level {level}")]
    Cancelled { level: u32 },

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl BuildError {
    /// Build an [`BuildError::Io`] from a path and an underlying error.
    pub fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        BuildError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
