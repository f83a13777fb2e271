//! Configuration management for the Deep Zoom builder.
//!
//! This module provides:
//! - Command-line arguments via clap
//! - Environment variables with `DEEPZOOM_` prefix
//! - [`BuildConfig`], the explicit settings threaded through every build step
//!
//! # Example
//!
//! ```ignore
//! use deepzoom_builder::config::Cli;
//!
//! let cli = Cli::parse();
//! let config = cli.build_config();
//! println!("Writing {} tiles with {} workers", config.format, config.workers);
//! ```
//!
//! # Environment Variables
//!
//! - `DEEPZOOM_FORMAT` - Tile format, `png` or `jpg` (default: jpg)
//! - `DEEPZOOM_WORKERS` - Rows processed in parallel (default: CPU count)
//!
//! Tile size (256), overlap (1) and JPEG quality (95) are fixed.

use std::path::PathBuf;

use clap::Parser;

use crate::geometry::{TILE_OVERLAP, TILE_SIZE};
use crate::tile::{TileFormat, MANIFEST_EXTENSIONS};

// =============================================================================
// Build Configuration
// =============================================================================

/// Settings for one pyramid build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    /// Tile edge length in pixels.
    pub tile_size: u32,

    /// Overlap in pixels on interior tile edges.
    pub overlap: u32,

    /// Output tile encoding.
    pub format: TileFormat,

    /// Maximum rows processed concurrently within a level.
    pub workers: usize,
}

impl BuildConfig {
    /// Fixed tiling with the given format and one worker per CPU.
    pub fn new(format: TileFormat) -> Self {
        Self {
            tile_size: TILE_SIZE,
            overlap: TILE_OVERLAP,
            format,
            workers: default_workers(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(TileFormat::default())
    }
}

/// Number of available CPUs, or 1 if unknown.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Deep Zoom Builder - convert one large image into a DZI tile pyramid.
///
/// Writes `<name>_files/<level>/<col>_<row>.<ext>` next to the destination
/// manifest, then the manifest itself.
#[derive(Parser, Debug, Clone)]
#[command(name = "deepzoom-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source image (PNG or JPEG).
    pub source: PathBuf,

    /// Destination manifest path (.dzi or .xml).
    pub destination: PathBuf,

    /// Tile format.
    #[arg(short, long, value_enum, default_value_t = TileFormat::Jpeg, env = "DEEPZOOM_FORMAT")]
    pub format: TileFormat,

    /// Rows processed in parallel within a level (default: CPU count).
    #[arg(short, long, env = "DEEPZOOM_WORKERS")]
    pub workers: Option<usize>,

    /// Print the build report as JSON on success.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Validate the arguments and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.source.is_file() {
            return Err(format!(
                "Source image not found: {}",
                self.source.display()
            ));
        }

        let extension = self
            .destination
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension {
            Some(ext) if MANIFEST_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => {
                return Err(format!(
                    "Destination must be a .dzi or .xml file, got {}",
                    self.destination.display()
                ))
            }
        }

        if self.workers == Some(0) {
            return Err("workers must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build settings derived from the arguments.
    pub fn build_config(&self) -> BuildConfig {
        let config = BuildConfig::new(self.format);
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
