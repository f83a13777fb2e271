//! Pyramid build orchestration.
//!
//! ```text
//! source ──decode──▶ RgbaImage ──slice──▶ level max ──composite──▶ level max-1 ─ … ─▶ level 0 ──▶ manifest
//! ```
//!
//! Levels run strictly one after another; tiles within a level run in
//! parallel. A level only starts once the completion counter of the level
//! above reports every tile persisted. The manifest is written last, so a
//! failed or cancelled build never leaves a manifest behind.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info};

use super::compositor::composite_level;
use super::progress::{BuildWarnings, CancelFlag, LevelProgress};
use super::slicer::slice_top_level;
use super::writer::TileWriter;
use super::LevelContext;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::geometry::{LevelGeometry, PyramidGeometry};
use crate::manifest::Manifest;
use crate::tile::{decode_source, PyramidLayout, TileFormat};

// =============================================================================
// Build Report
// =============================================================================

/// Summary of one persisted level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub columns: u32,
    pub rows: u32,
    pub tiles: usize,
}

impl From<&LevelGeometry> for LevelReport {
    fn from(level: &LevelGeometry) -> Self {
        Self {
            level: level.level,
            width: level.width(),
            height: level.height(),
            columns: level.columns(),
            rows: level.rows(),
            tiles: level.tile_count(),
        }
    }
}

/// Result of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub width: u32,
    pub height: u32,
    pub max_level: u32,
    pub format: TileFormat,
    pub manifest_path: String,
    pub files_dir: String,
    /// Levels from finest to coarsest.
    pub levels: Vec<LevelReport>,
    /// Recovered problems, e.g. upper tiles that could not be decoded.
    pub warnings: Vec<String>,
}

impl BuildReport {
    pub fn total_tiles(&self) -> usize {
        self.levels.iter().map(|l| l.tiles).sum()
    }
}

// =============================================================================
// Pyramid Builder
// =============================================================================

/// Builds a Deep Zoom pyramid from a single image.
///
/// # Example
///
/// ```no_run
/// use deepzoom_builder::{BuildConfig, PyramidBuilder, TileFormat};
///
/// #[tokio::main]
/// async fn main() {
///     let builder = PyramidBuilder::new(BuildConfig::new(TileFormat::Png));
///     let report = builder.build("photo.jpg", "out/photo.dzi").await.unwrap();
///     println!("{} levels, {} tiles", report.max_level + 1, report.total_tiles());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PyramidBuilder {
    config: BuildConfig,
    cancel: CancelFlag,
}

impl PyramidBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Use an existing cancellation flag (e.g. one wired to Ctrl-C).
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels this builder's runs at the next tile boundary.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Decode `source` and build the pyramid described by `destination`.
    pub async fn build(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<BuildReport, BuildError> {
        let source = source.as_ref().to_path_buf();
        // Validate the destination before paying for a large decode.
        PyramidLayout::from_destination(destination.as_ref())?;

        info!("Decoding source image: {}", source.display());
        let decode_path = source.clone();
        let image = tokio::task::spawn_blocking(move || decode_source(&decode_path))
            .await
            .map_err(|e| BuildError::Worker(e.to_string()))?
            .map_err(|e| BuildError::SourceDecode {
                path: source.display().to_string(),
                source: e,
            })?;

        self.build_from_image(image, destination).await
    }

    /// Build the pyramid from already decoded pixels.
    ///
    /// The image is consumed and released once the top level is sliced.
    pub async fn build_from_image(
        &self,
        image: RgbaImage,
        destination: impl AsRef<Path>,
    ) -> Result<BuildReport, BuildError> {
        let (width, height) = image.dimensions();
        let geometry = PyramidGeometry::with_tiling(
            width,
            height,
            self.config.tile_size,
            self.config.overlap,
        )?;
        let layout = PyramidLayout::from_destination(destination)?;
        let writer = Arc::new(TileWriter::new(layout.clone(), self.config.format));
        let warnings = Arc::new(BuildWarnings::new());
        let workers = self.config.workers;

        info!(
            "Building {}x{} pyramid: levels 0..={}, {} tiles, {} workers",
            width, height, geometry.max_level, self.config.format, workers
        );

        let mut levels = Vec::with_capacity(geometry.max_level as usize + 1);

        // Top level straight from the source
        let top = geometry.level(geometry.max_level);
        let ctx = self.level_context(&writer, &warnings, &top, &layout)?;
        let progress = Arc::clone(&ctx.progress);
        slice_top_level(image, top, ctx, workers).await?;
        ensure_complete(&progress)?;
        levels.push(LevelReport::from(&top));

        // Every lower level from the one above
        let mut upper = top;
        for target in geometry.levels_descending().skip(1) {
            if self.cancel.is_cancelled() {
                return Err(BuildError::Cancelled {
                    level: target.level,
                });
            }

            let ctx = self.level_context(&writer, &warnings, &target, &layout)?;
            let progress = Arc::clone(&ctx.progress);
            composite_level(target, upper, ctx, workers).await?;
            ensure_complete(&progress)?;
            levels.push(LevelReport::from(&target));
            upper = target;
        }

        let manifest = Manifest {
            tile_size: geometry.tile_size,
            overlap: geometry.overlap,
            format: self.config.format,
            width,
            height,
            max_level: geometry.max_level,
        };
        manifest.write(layout.manifest_path())?;

        let report = BuildReport {
            width,
            height,
            max_level: geometry.max_level,
            format: self.config.format,
            manifest_path: layout.manifest_path().display().to_string(),
            files_dir: layout.files_dir().display().to_string(),
            levels,
            warnings: warnings.snapshot(),
        };

        info!(
            "Pyramid complete: {} tiles across {} levels ({} warnings)",
            report.total_tiles(),
            report.levels.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    fn level_context(
        &self,
        writer: &Arc<TileWriter>,
        warnings: &Arc<BuildWarnings>,
        level: &LevelGeometry,
        layout: &PyramidLayout,
    ) -> Result<LevelContext, BuildError> {
        let dir = layout.create_level_dir(level.level)?;
        debug!("Level {} directory: {}", level.level, dir.display());

        Ok(LevelContext {
            writer: Arc::clone(writer),
            progress: Arc::new(LevelProgress::new(level.level, level.tile_count())),
            cancel: self.cancel.clone(),
            warnings: Arc::clone(warnings),
        })
    }
}

fn ensure_complete(progress: &LevelProgress) -> Result<(), BuildError> {
    if progress.is_complete() {
        info!(
            "Level {} complete ({} tiles)",
            progress.level(),
            progress.completed()
        );
        return Ok(());
    }

    Err(BuildError::Worker(format!(
        "level {} incomplete: {} of {} tiles written",
        progress.level(),
        progress.completed(),
        progress.expected()
    )))
}
