//! Level compositor.
//!
//! Derives every level below the top from the persisted tiles of the level
//! directly above it. For a target tile the compositor:
//!
//! 1. maps the tile's rectangle into the upper level (position and size x2)
//! 2. pastes every intersecting upper tile into a mosaic of that mapped area
//! 3. box-filters the mosaic down by exactly 2x
//! 4. encodes and writes the result
//!
//! The mosaic records which upper pixels were actually covered. Uncovered
//! pixels (missing or undecodable upper tiles) are excluded from the average,
//! and target pixels with no coverage at all stay transparent.
//!
//! Because an upper tile is read by several neighboring targets, decoded
//! tiles are kept in a small LRU cache that lives for one target row.

use std::num::NonZeroUsize;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use lru::LruCache;
use tracing::{debug, info};

use super::worker::run_rows;
use super::LevelContext;
use crate::error::BuildError;
use crate::geometry::{LevelGeometry, Rect};
use crate::tile::TileAddress;

/// Decoded upper tiles kept per target row.
const ROW_DECODE_CACHE_CAPACITY: usize = 32;

// =============================================================================
// Mosaic
// =============================================================================

/// Upper-level pixels covering one target tile's mapped rectangle.
#[derive(Debug)]
pub struct Mosaic {
    area: Rect,
    pixels: RgbaImage,
    covered: Vec<bool>,
}

impl Mosaic {
    /// Empty mosaic over `area` (upper-level coordinates).
    pub fn new(area: Rect) -> Self {
        let (width, height) = area.size();
        Self {
            area,
            pixels: RgbaImage::new(width, height),
            covered: vec![false; width as usize * height as usize],
        }
    }

    /// Paste the part of `tile` (placed at `tile_rect`) that falls inside the
    /// mosaic area.
    ///
    /// Returns the number of pixels pasted.
    pub fn paste(&mut self, tile: &RgbaImage, tile_rect: &Rect) -> usize {
        // Never read past the decoded pixels, whatever the rect claims.
        let placed = Rect::new(
            tile_rect.x,
            tile_rect.y,
            tile_rect.width.min(tile.width() as i64),
            tile_rect.height.min(tile.height() as i64),
        );
        let overlap = placed.intersection(&self.area);
        if overlap.is_empty() {
            return 0;
        }

        let src = overlap.relative_to(&placed);
        let dst = overlap.relative_to(&self.area);
        let stride = self.pixels.width() as usize;
        for dy in 0..overlap.height {
            for dx in 0..overlap.width {
                let pixel = *tile.get_pixel((src.x + dx) as u32, (src.y + dy) as u32);
                let mx = (dst.x + dx) as u32;
                let my = (dst.y + dy) as u32;
                self.pixels.put_pixel(mx, my, pixel);
                self.covered[my as usize * stride + mx as usize] = true;
            }
        }

        (overlap.width * overlap.height) as usize
    }

    /// Box-filter the mosaic down by 2x.
    ///
    /// Each output pixel is the rounded mean of the covered pixels in its 2x2
    /// block; blocks with no coverage are transparent.
    pub fn downsample(&self) -> RgbaImage {
        box_downsample(&self.pixels, |x, y| {
            self.covered[y as usize * self.pixels.width() as usize + x as usize]
        })
    }
}

/// Box-filter an image down by 2x, rounding odd dimensions up.
///
/// A trailing odd row or column averages only the pixels that exist.
pub fn downsample_half(image: &RgbaImage) -> RgbaImage {
    box_downsample(image, |_, _| true)
}

fn box_downsample<F>(src: &RgbaImage, covered: F) -> RgbaImage
where
    F: Fn(u32, u32) -> bool,
{
    let (src_w, src_h) = src.dimensions();
    let dst_w = src_w.div_ceil(2);
    let dst_h = src_h.div_ceil(2);

    RgbaImage::from_fn(dst_w, dst_h, |dx, dy| {
        let mut sum = [0u32; 4];
        let mut count = 0u32;

        for sy in (2 * dy)..(2 * dy + 2).min(src_h) {
            for sx in (2 * dx)..(2 * dx + 2).min(src_w) {
                if !covered(sx, sy) {
                    continue;
                }
                let p = src.get_pixel(sx, sy).0;
                for (acc, v) in sum.iter_mut().zip(p) {
                    *acc += v as u32;
                }
                count += 1;
            }
        }

        if count == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let mean = |v: u32| ((v + count / 2) / count) as u8;
        Rgba([mean(sum[0]), mean(sum[1]), mean(sum[2]), mean(sum[3])])
    })
}

// =============================================================================
// Level Compositor
// =============================================================================

/// Builds the tiles of `target` from the persisted tiles of `upper`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LevelCompositor {
    target: LevelGeometry,
    upper: LevelGeometry,
}

type DecodeCache = LruCache<(u32, u32), Option<Arc<RgbaImage>>>;

impl LevelCompositor {
    pub(crate) fn new(target: LevelGeometry, upper: LevelGeometry) -> Self {
        debug_assert_eq!(target.level + 1, upper.level);
        Self { target, upper }
    }

    /// Composite one target tile from the upper level.
    fn composite_tile(
        &self,
        col: u32,
        row: u32,
        ctx: &LevelContext,
        cache: &mut DecodeCache,
    ) -> RgbaImage {
        let mapped = self.target.tile_rect(col, row).scaled(2);
        let mut mosaic = Mosaic::new(mapped);

        for (tx, ty, rect) in self.target.contributing_tiles(col, row, &self.upper) {
            if let Some(tile) = self.upper_tile(tx, ty, ctx, cache) {
                mosaic.paste(&tile, &rect);
            }
        }

        mosaic.downsample()
    }

    /// Decode an upper tile, consulting the row cache first.
    ///
    /// Failures are recorded as warnings and cached as `None` so the same
    /// tile is not retried within the row.
    fn upper_tile(
        &self,
        tx: u32,
        ty: u32,
        ctx: &LevelContext,
        cache: &mut DecodeCache,
    ) -> Option<Arc<RgbaImage>> {
        if let Some(entry) = cache.get(&(tx, ty)) {
            return entry.clone();
        }

        let address = TileAddress::new(self.upper.level, tx, ty);
        let path = ctx.writer.tile_path(address);
        let entry = if !path.exists() {
            ctx.warnings
                .push(format!("{} is missing, leaving its area blank", address));
            None
        } else {
            match ctx.writer.codec().decode_file(&path) {
                Ok(img) => Some(Arc::new(img)),
                Err(e) => {
                    ctx.warnings
                        .push(format!("{} skipped, leaving its area blank: {}", address, e));
                    None
                }
            }
        };

        cache.put((tx, ty), entry.clone());
        entry
    }

    /// Composite and persist one target row.
    pub(crate) fn composite_row(&self, row: u32, ctx: &LevelContext) -> Result<(), BuildError> {
        let capacity = NonZeroUsize::new(ROW_DECODE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        let mut cache: DecodeCache = LruCache::new(capacity);

        for col in 0..=self.target.max_col {
            if ctx.cancel.is_cancelled() {
                return Err(BuildError::Cancelled {
                    level: self.target.level,
                });
            }

            let canvas = self.composite_tile(col, row, ctx, &mut cache);
            ctx.writer.write(TileAddress::new(self.target.level, col, row), &canvas)?;
            ctx.progress.record_tile();
        }

        debug!(
            "Level {} row {} done ({} upper tiles decoded)",
            self.target.level,
            row,
            cache.len()
        );
        Ok(())
    }
}

/// Build every tile of `target` from `upper`, rows in parallel.
///
/// Every tile of `upper` must already be persisted.
pub(crate) async fn composite_level(
    target: LevelGeometry,
    upper: LevelGeometry,
    ctx: LevelContext,
    workers: usize,
) -> Result<(), BuildError> {
    info!(
        "Compositing level {} from level {} ({}x{}, {} tiles)",
        target.level,
        upper.level,
        target.width(),
        target.height(),
        target.tile_count()
    );

    let compositor = LevelCompositor::new(target, upper);
    run_rows(target.rows(), workers, move |row| {
        compositor.composite_row(row, &ctx)
    })
    .await
}
