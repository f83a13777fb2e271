//! On-disk layout of a Deep Zoom pyramid.
//!
//! For a destination `out/photo.dzi` the layout is:
//!
//! ```text
//! out/photo.dzi                 manifest
//! out/photo_files/              tile root
//! out/photo_files/{level}/      one directory per level
//! out/photo_files/{level}/{col}_{row}.{png|jpg}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::codec::TileFormat;
use crate::error::BuildError;

/// Manifest extensions accepted for the destination path.
pub const MANIFEST_EXTENSIONS: [&str; 2] = ["dzi", "xml"];

// =============================================================================
// Tile Address
// =============================================================================

/// Identifies one tile file: level plus zero-based column and row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileAddress {
    pub level: u32,
    pub col: u32,
    pub row: u32,
}

impl TileAddress {
    pub const fn new(level: u32, col: u32, row: u32) -> Self {
        Self { level, col, row }
    }

    /// File name without directory, e.g. `3_5.jpg`.
    pub fn file_name(&self, format: TileFormat) -> String {
        format!("{}_{}.{}", self.col, self.row, format.extension())
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} tile {}_{}", self.level, self.col, self.row)
    }
}

/// Parse tile coordinates from a file name like `3_5.jpg`, `3_5.png` or `3_5`.
///
/// Returns `(col, row)`.
pub fn parse_tile_file_name(filename: &str) -> Option<(u32, u32)> {
    let name = filename
        .strip_suffix(".jpg")
        .or_else(|| filename.strip_suffix(".png"))
        .unwrap_or(filename);

    let (col, row) = name.split_once('_')?;
    if row.contains('_') {
        return None;
    }

    Some((col.parse().ok()?, row.parse().ok()?))
}

// =============================================================================
// Pyramid Layout
// =============================================================================

/// Resolved output paths for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidLayout {
    manifest_path: PathBuf,
    files_dir: PathBuf,
}

impl PyramidLayout {
    /// Derive the layout from the manifest destination.
    ///
    /// The destination must have a `.dzi` or `.xml` extension and a file stem.
    pub fn from_destination(destination: impl AsRef<Path>) -> Result<Self, BuildError> {
        let destination = destination.as_ref();
        let invalid = |reason: &str| BuildError::InvalidDestination {
            path: destination.display().to_string(),
            reason: reason.to_string(),
        };

        let extension = destination
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| invalid("missing extension (expected .dzi or .xml)"))?;

        if !MANIFEST_EXTENSIONS.contains(&extension.as_str()) {
            return Err(invalid("extension must be .dzi or .xml"));
        }

        let stem = destination
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing file name"))?;

        let parent = destination.parent().unwrap_or_else(|| Path::new(""));
        let files_dir = parent.join(format!("{}_files", stem));

        Ok(Self {
            manifest_path: destination.to_path_buf(),
            files_dir,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The `name_files` directory holding every level.
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    pub fn level_dir(&self, level: u32) -> PathBuf {
        self.files_dir.join(level.to_string())
    }

    pub fn tile_path(&self, address: TileAddress, format: TileFormat) -> PathBuf {
        self.level_dir(address.level).join(address.file_name(format))
    }

    /// Create the directory for `level` (and any missing parents).
    pub fn create_level_dir(&self, level: u32) -> Result<PathBuf, BuildError> {
        let dir = self.level_dir(level);
        std::fs::create_dir_all(&dir).map_err(|e| BuildError::io(&dir, e))?;
        Ok(dir)
    }
}
