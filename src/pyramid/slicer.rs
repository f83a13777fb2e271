//! Top-level slicer.
//!
//! Cuts the full-resolution source directly into the tiles of the highest
//! level. Every tile is an exact copy of its (overlap-extended, clipped)
//! rectangle of the source, so lower levels can be derived from these files
//! alone.

use std::sync::Arc;

use image::{imageops, RgbaImage};
use tracing::info;

use super::worker::run_rows;
use super::LevelContext;
use crate::error::BuildError;
use crate::geometry::{LevelGeometry, Rect};
use crate::tile::TileAddress;

/// Copy `rect` of `source` into a new canvas of the rectangle's size.
///
/// The canvas origin is the rectangle's top-left corner. Parts of the
/// rectangle outside the source are clipped away.
pub fn extract_tile(source: &RgbaImage, rect: &Rect) -> RgbaImage {
    let clipped = rect.intersection(&Rect::from_size(source.width(), source.height()));
    let (width, height) = clipped.size();
    if width == 0 || height == 0 {
        return RgbaImage::new(0, 0);
    }

    imageops::crop_imm(source, clipped.x as u32, clipped.y as u32, width, height).to_image()
}

/// Slice and persist one row of the top level.
pub(crate) fn slice_row(
    source: &RgbaImage,
    level: &LevelGeometry,
    row: u32,
    ctx: &LevelContext,
) -> Result<(), BuildError> {
    for col in 0..=level.max_col {
        if ctx.cancel.is_cancelled() {
            return Err(BuildError::Cancelled { level: level.level });
        }

        let rect = level.tile_rect(col, row);
        let canvas = extract_tile(source, &rect);
        ctx.writer.write(TileAddress::new(level.level, col, row), &canvas)?;
        ctx.progress.record_tile();
    }
    Ok(())
}

/// Slice the whole top level, rows in parallel.
///
/// Takes ownership of the source; it is released as soon as the last row
/// has been written.
pub(crate) async fn slice_top_level(
    source: RgbaImage,
    level: LevelGeometry,
    ctx: LevelContext,
    workers: usize,
) -> Result<(), BuildError> {
    info!(
        "Slicing level {} ({}x{}, {} tiles)",
        level.level,
        level.width(),
        level.height(),
        level.tile_count()
    );

    let source = Arc::new(source);
    let job_source = Arc::clone(&source);

    run_rows(level.rows(), workers, move |row| {
        slice_row(&job_source, &level, row, &ctx)
    })
    .await?;

    // Row jobs are joined, so this is the last reference to the source.
    drop(source);
    Ok(())
}
