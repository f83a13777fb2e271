//! Pyramid geometry.
//!
//! Pure arithmetic for Deep Zoom pyramids: level count, per-level bounds,
//! tile grids and tile rectangles. Nothing in here touches pixels or the
//! filesystem, so every rule about overlap and clipping can be tested on its
//! own.
//!
//! # Level Numbering
//!
//! Deep Zoom numbers levels from the bottom of the pyramid:
//! - level 0 = 1x1 pixel (lowest resolution)
//! - max level = full resolution, `ceil(log2(max(width, height)))`
//!
//! Level `L` is the source downscaled by `2^(max_level - L)`, rounding up.
//!
//! # Tile Rectangles
//!
//! Tile `(col, row)` nominally covers `[col * 256, (col + 1) * 256)`, extended
//! by the overlap on every side and then clipped to the level bounds:
//!
//! ```text
//!   x = col * tile_size - overlap          (clipped to >= 0)
//!   w = tile_size + 2 * overlap            (clipped to the level's right edge)
//! ```
//!
//! The tile grid uses inclusive bounds (`col <= floor(width / tile_size)`), so
//! a level whose width is an exact multiple of the tile size gets a trailing
//! column that contains only the 1 px overlap.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::GeometryError;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Overlap in pixels shared with each neighboring tile.
pub const TILE_OVERLAP: u32 = 1;

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle in the pixel space of one level.
///
/// Coordinates are signed so that unclipped tile rectangles may start at -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i64, height as i64)
    }

    #[inline]
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Intersection of two rectangles.
    ///
    /// Disjoint rectangles produce an empty rectangle at `self`'s origin.
    pub fn intersection(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return Rect::new(self.x, self.y, 0, 0);
        }

        Rect::new(x, y, right - x, bottom - y)
    }

    /// Whether the rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty() && !other.is_empty() && !self.intersection(other).is_empty()
    }

    /// Scale position and size by an integer factor.
    ///
    /// Used to map a rectangle into the next finer level (`factor = 2`).
    pub fn scaled(&self, factor: i64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Shift the rectangle by `(-origin.x, -origin.y)`.
    pub fn relative_to(&self, origin: &Rect) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    /// Width and height as unsigned pixel counts (0 when empty).
    pub fn size(&self) -> (u32, u32) {
        if self.is_empty() {
            return (0, 0);
        }
        (self.width as u32, self.height as u32)
    }
}

// =============================================================================
// Level arithmetic
// =============================================================================

/// Maximum pyramid level for an image: `ceil(log2(max(width, height)))`.
///
/// A 1x1 image has a single level 0.
pub fn max_level(width: u32, height: u32) -> Result<u32, GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::InvalidDimension { width, height });
    }

    let max_dim = width.max(height);
    // ceil(log2(n)) == number of bits needed to represent n - 1
    Ok(u32::BITS - (max_dim - 1).leading_zeros())
}

/// Downsample factor of `level` relative to full resolution.
///
/// Returns 0.0 for levels above `max_level`.
pub fn level_scale_factor(max_level: u32, level: u32) -> f64 {
    if level > max_level {
        return 0.0;
    }
    2f64.powi((max_level - level) as i32)
}

/// Bounds of `level`: source size divided by the scale factor, rounded up.
pub fn level_bounds(width: u32, height: u32, max_level: u32, level: u32) -> Rect {
    if level > max_level {
        return Rect::default();
    }

    let scale = 1u64 << (max_level - level);
    let level_width = (width as u64).div_ceil(scale);
    let level_height = (height as u64).div_ceil(scale);

    Rect::new(0, 0, level_width as i64, level_height as i64)
}

/// Inclusive tile grid bounds `(max_col, max_row)` for a level.
pub fn tile_grid(level_width: u32, level_height: u32, tile_size: u32) -> (u32, u32) {
    (level_width / tile_size, level_height / tile_size)
}

/// Rectangle of tile `(col, row)`, overlap included, clipped to `level_bounds`.
pub fn tile_source_rect(
    col: u32,
    row: u32,
    level_bounds: &Rect,
    tile_size: u32,
    overlap: u32,
) -> Rect {
    let ts = tile_size as i64;
    let ov = overlap as i64;

    let unclipped = Rect::new(
        col as i64 * ts - ov,
        row as i64 * ts - ov,
        ts + 2 * ov,
        ts + 2 * ov,
    );

    unclipped.intersection(level_bounds)
}

// =============================================================================
// Pyramid / Level Geometry
// =============================================================================

/// Geometry of a whole pyramid for one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidGeometry {
    pub width: u32,
    pub height: u32,
    pub max_level: u32,
    pub tile_size: u32,
    pub overlap: u32,
}

impl PyramidGeometry {
    /// Plan a pyramid with the fixed tile size and overlap.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        Self::with_tiling(width, height, TILE_SIZE, TILE_OVERLAP)
    }

    /// Plan a pyramid with an explicit tile size and overlap.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidTiling`] unless `tile_size > 0` and
    /// `overlap < tile_size`, and [`GeometryError::InvalidDimension`] for a
    /// zero width or height.
    pub fn with_tiling(
        width: u32,
        height: u32,
        tile_size: u32,
        overlap: u32,
    ) -> Result<Self, GeometryError> {
        if tile_size == 0 || overlap >= tile_size {
            return Err(GeometryError::InvalidTiling { tile_size, overlap });
        }
        let max_level = max_level(width, height)?;
        Ok(Self {
            width,
            height,
            max_level,
            tile_size,
            overlap,
        })
    }

    /// Geometry of a single level.
    ///
    /// Levels above `max_level` are clamped to `max_level`.
    pub fn level(&self, level: u32) -> LevelGeometry {
        let level = level.min(self.max_level);
        let bounds = level_bounds(self.width, self.height, self.max_level, level);
        let (w, h) = bounds.size();
        let (max_col, max_row) = tile_grid(w, h, self.tile_size);

        LevelGeometry {
            level,
            bounds,
            max_col,
            max_row,
            tile_size: self.tile_size,
            overlap: self.overlap,
        }
    }

    /// Levels from finest to coarsest.
    pub fn levels_descending(&self) -> impl Iterator<Item = LevelGeometry> + '_ {
        (0..=self.max_level).rev().map(move |l| self.level(l))
    }
}

/// Tile layout of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGeometry {
    pub level: u32,
    pub bounds: Rect,
    /// Inclusive maximum column index.
    pub max_col: u32,
    /// Inclusive maximum row index.
    pub max_row: u32,
    pub tile_size: u32,
    pub overlap: u32,
}

impl LevelGeometry {
    pub fn width(&self) -> u32 {
        self.bounds.size().0
    }

    pub fn height(&self) -> u32 {
        self.bounds.size().1
    }

    pub fn columns(&self) -> u32 {
        self.max_col + 1
    }

    pub fn rows(&self) -> u32 {
        self.max_row + 1
    }

    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn contains_tile(&self, col: u32, row: u32) -> bool {
        col <= self.max_col && row <= self.max_row
    }

    /// Clipped rectangle of tile `(col, row)` in this level's pixel space.
    pub fn tile_rect(&self, col: u32, row: u32) -> Rect {
        tile_source_rect(col, row, &self.bounds, self.tile_size, self.overlap)
    }

    /// All `(col, row)` pairs, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32)> {
        let max_col = self.max_col;
        (0..=self.max_row).flat_map(move |row| (0..=max_col).map(move |col| (col, row)))
    }

    /// Tiles of the next finer level (`upper`) that contribute to tile
    /// `(col, row)` of this level.
    ///
    /// Candidates are the upper tiles whose unclipped extent can reach the
    /// mapped rectangle, clamped to the upper grid, and kept only when their
    /// clipped rectangle intersects it. With the fixed 256/1 tiling this is
    /// `[2col - 1, 2col + 2]` on each axis.
    pub fn contributing_tiles(
        &self,
        col: u32,
        row: u32,
        upper: &LevelGeometry,
    ) -> Vec<(u32, u32, Rect)> {
        let mapped = self.tile_rect(col, row).scaled(2);
        if mapped.is_empty() {
            return Vec::new();
        }

        let tx_range = upper.candidate_span(mapped.x, mapped.right(), upper.max_col);
        let ty_range = upper.candidate_span(mapped.y, mapped.bottom(), upper.max_row);

        let mut found = Vec::new();
        for ty in ty_range {
            for tx in tx_range.clone() {
                let rect = upper.tile_rect(tx, ty);
                if rect.intersects(&mapped) {
                    found.push((tx, ty, rect));
                }
            }
        }
        found
    }

    /// Tile indices in `[0, max_index]` whose extent `[t*ts - ov, (t+1)*ts + ov)`
    /// intersects `[start, end)`.
    fn candidate_span(&self, start: i64, end: i64, max_index: u32) -> RangeInclusive<u32> {
        let ts = self.tile_size as i64;
        let ov = self.overlap as i64;

        let first = ((start - ov - ts).div_euclid(ts) + 1).max(0);
        let last = (end + ov - 1).div_euclid(ts).min(max_index as i64);
        if last < first {
            // Empty range.
            return 1..=0;
        }
        first as u32..=last as u32
    }
}

// =============================================================================
// Tests
// =============================================================================
