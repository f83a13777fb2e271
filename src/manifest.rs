//! Deep Zoom Image (DZI) manifest.
//!
//! The manifest is the only file a viewer reads before requesting tiles. It
//! is written once, after every level has been persisted.
//!
//! # Example Output
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Image xmlns="http://schemas.microsoft.com/deepzoom/2008" TileSize="256" Overlap="1" Format="jpg">
//!   <Size Width="300" Height="200" />
//!   <DisplayRects>
//!     <DisplayRect MinLevel="1" MaxLevel="9">
//!       <Rect X="0" Y="0" Width="300" Height="200" />
//!     </DisplayRect>
//!   </DisplayRects>
//! </Image>
//! ```

use std::path::Path;

use tracing::info;

use crate::error::BuildError;
use crate::tile::TileFormat;

/// Deep Zoom XML namespace.
pub const DZI_NAMESPACE: &str = "http://schemas.microsoft.com/deepzoom/2008";

/// Lowest level advertised in `DisplayRect`.
pub const DISPLAY_MIN_LEVEL: u32 = 1;

/// Everything the manifest describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub tile_size: u32,
    pub overlap: u32,
    pub format: TileFormat,
    pub width: u32,
    pub height: u32,
    pub max_level: u32,
}

impl Manifest {
    /// Render the manifest as an XML document.
    pub fn to_xml(&self) -> String {
        let Manifest {
            tile_size,
            overlap,
            format,
            width,
            height,
            max_level,
        } = *self;
        let format = format.manifest_name();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Image xmlns="{DZI_NAMESPACE}" TileSize="{tile_size}" Overlap="{overlap}" Format="{format}">
  <Size Width="{width}" Height="{height}" />
  <DisplayRects>
    <DisplayRect MinLevel="{DISPLAY_MIN_LEVEL}" MaxLevel="{max_level}">
      <Rect X="0" Y="0" Width="{width}" Height="{height}" />
    </DisplayRect>
  </DisplayRects>
</Image>
"#
        )
    }

    /// Write the manifest to `path`.
    ///
    /// Any failure is reported as [`BuildError::ManifestWrite`].
    pub fn write(&self, path: &Path) -> Result<(), BuildError> {
        let write_err = |message: String| BuildError::ManifestWrite {
            path: path.display().to_string(),
            message,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(path, self.to_xml()).map_err(|e| write_err(e.to_string()))?;

        info!("Wrote manifest: {}", path.display());
        Ok(())
    }
}
