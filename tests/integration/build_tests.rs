//! End-to-end pyramid build tests.
//!
//! Tests verify:
//! - Tile grids and tile dimensions at the top and bottom of the pyramid
//! - PNG/JPEG extensions and manifest format
//! - Lower levels equal a direct 2x box downsample of the level above
//! - Overlap bands agree between neighbors at derived levels
//! - Rebuilding into the same destination is idempotent
//! - Sources past the image crate's default decode cap still decode

use std::collections::BTreeSet;

use deepzoom_builder::{
    decode_file, decode_source, downsample_half, BuildConfig, BuildError, PyramidBuilder,
    PyramidGeometry, TileFormat,
};
use image::RgbaImage;
use tempfile::TempDir;

use super::test_utils::{
    build_pyramid, list_files, max_channel_diff, patterned_image, tile_dimensions,
    write_source_png, write_streamed_gray_png,
};

// =============================================================================
// Scenario Tests
// =============================================================================

#[tokio::test]
async fn test_512_square_pyramid() {
    let built = build_pyramid(patterned_image(512, 512), TileFormat::Png).await;
    assert_eq!(built.report.max_level, 9);

    // Inclusive grid: two full tiles plus the 1 px trailing column/row
    let top = built.level_tiles(9);
    for expected in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        assert!(top.contains(&expected), "missing top tile {:?}", expected);
    }
    assert_eq!(top.len(), 9);

    assert_eq!(built.tile(9, 0, 0).dimensions(), (257, 257));
    assert_eq!(built.tile(9, 1, 1).dimensions(), (257, 257));
    assert_eq!(built.tile(9, 2, 0).dimensions(), (1, 257));
    assert_eq!(built.tile(9, 2, 2).dimensions(), (1, 1));

    // Level 8 is 256x256: one full tile plus the trailing overlap tiles
    assert_eq!(built.tile(8, 0, 0).dimensions(), (256, 256));
    assert_eq!(built.tile(8, 1, 0).dimensions(), (1, 256));

    // Coarsest level is a single 1x1 tile
    assert_eq!(built.level_tiles(0), BTreeSet::from([(0, 0)]));
    assert_eq!(built.tile(0, 0, 0).dimensions(), (1, 1));
}

#[tokio::test]
async fn test_300x200_pyramid() {
    let built = build_pyramid(patterned_image(300, 200), TileFormat::Png).await;
    assert_eq!(built.report.max_level, 9);

    assert_eq!(
        built.level_files(9),
        BTreeSet::from(["0_0.png".to_string(), "1_0.png".to_string()])
    );
    assert_eq!(built.tile(9, 0, 0).dimensions(), (257, 200));
    assert_eq!(built.tile(9, 1, 0).dimensions(), (45, 200));

    // 150x100 fits in one tile
    assert_eq!(built.level_tiles(8), BTreeSet::from([(0, 0)]));
    assert_eq!(built.tile(8, 0, 0).dimensions(), (150, 100));

    let top = &built.report.levels[0];
    assert_eq!((top.level, top.columns, top.rows), (9, 2, 1));
    assert_eq!(built.report.levels.last().unwrap().level, 0);
    assert!(built.report.warnings.is_empty());
}

#[tokio::test]
async fn test_every_level_directory_exists() {
    let built = build_pyramid(patterned_image(70, 33), TileFormat::Png).await;
    let levels = list_files(&built.files_dir());

    let expected: BTreeSet<String> = (0..=built.report.max_level).map(|l| l.to_string()).collect();
    assert_eq!(levels, expected);
}

#[tokio::test]
async fn test_jpeg_output() {
    let built = build_pyramid(patterned_image(300, 200), TileFormat::Jpeg).await;

    for level in 0..=built.report.max_level {
        for name in built.level_files(level) {
            assert!(name.ends_with(".jpg"), "unexpected tile file {}", name);
        }
    }
    assert!(built.manifest_xml().contains("Format=\"jpg\""));
    assert_eq!(built.tile(9, 1, 0).dimensions(), (45, 200));
}

#[tokio::test]
async fn test_png_output() {
    let built = build_pyramid(patterned_image(300, 200), TileFormat::Png).await;

    for level in 0..=built.report.max_level {
        for name in built.level_files(level) {
            assert!(name.ends_with(".png"), "unexpected tile file {}", name);
        }
    }
    assert!(built.manifest_xml().contains("Format=\"png\""));
}

// =============================================================================
// Pixel Consistency Tests
// =============================================================================

#[tokio::test]
async fn test_top_level_reproduces_source() {
    let source = patterned_image(530, 270);
    let built = build_pyramid(source.clone(), TileFormat::Png).await;
    let geometry = PyramidGeometry::new(530, 270).unwrap();

    let stitched = built.stitch_level(&geometry, geometry.max_level);
    assert_eq!(stitched, source);
}

#[tokio::test]
async fn test_lower_levels_match_direct_downsample() {
    let source = patterned_image(700, 530);
    let built = build_pyramid(source.clone(), TileFormat::Png).await;
    let geometry = PyramidGeometry::new(700, 530).unwrap();

    let mut expected = source;
    for level in (0..geometry.max_level).rev() {
        expected = downsample_half(&expected);
        let stitched = built.stitch_level(&geometry, level);

        assert_eq!(stitched.dimensions(), expected.dimensions(), "level {}", level);
        assert_eq!(
            max_channel_diff(&stitched, &expected),
            0,
            "level {} differs from direct downsample",
            level
        );
    }
}

#[tokio::test]
async fn test_jpeg_levels_close_to_direct_downsample() {
    let source = RgbaImage::from_fn(600, 400, |x, y| {
        image::Rgba([(x / 3) as u8, (y / 2) as u8, 128, 255])
    });
    let built = build_pyramid(source.clone(), TileFormat::Jpeg).await;
    let geometry = PyramidGeometry::new(600, 400).unwrap();

    let level = geometry.max_level - 1;
    let expected = downsample_half(&source);
    let stitched = built.stitch_level(&geometry, level);

    // Compare the interior, away from lossy block edges at the image border
    let (w, h) = stitched.dimensions();
    let crop = |img: &RgbaImage| image::imageops::crop_imm(img, 8, 8, w - 16, h - 16).to_image();
    assert!(max_channel_diff(&crop(&stitched), &crop(&expected)) <= 12);
}

#[tokio::test]
async fn test_overlap_columns_agree_at_derived_level() {
    let built = build_pyramid(patterned_image(1100, 600), TileFormat::Png).await;
    let level = built.report.max_level - 1; // 550x300

    let left = built.tile(level, 0, 0);
    let right = built.tile(level, 1, 0);
    assert_eq!(left.width(), 257);

    // Left spans [0, 257), right starts at 255
    for y in 0..left.height().min(right.height()) {
        assert_eq!(left.get_pixel(255, y), right.get_pixel(0, y));
        assert_eq!(left.get_pixel(256, y), right.get_pixel(1, y));
    }

    let top = built.tile(level, 0, 0);
    let bottom = built.tile(level, 0, 1);
    for x in 0..top.width().min(bottom.width()) {
        assert_eq!(top.get_pixel(x, 255), bottom.get_pixel(x, 0));
    }
}

// =============================================================================
// Rebuild and Failure Tests
// =============================================================================

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let source = write_source_png(dir.path(), "source.png", &patterned_image(400, 300));
    let dest = dir.path().join("out").join("photo.xml");
    let builder = PyramidBuilder::new(BuildConfig::new(TileFormat::Png).with_workers(3));

    let first = builder.build(&source, &dest).await.unwrap();
    let manifest_first = std::fs::read(&dest).unwrap();
    let files_dir = dir.path().join("out").join("photo_files");
    let listing_first: Vec<_> = (0..=first.max_level)
        .map(|l| list_files(&files_dir.join(l.to_string())))
        .collect();
    let dims_first = tile_dimensions(&files_dir, first.max_level);

    let second = builder.build(&source, &dest).await.unwrap();
    let manifest_second = std::fs::read(&dest).unwrap();
    let listing_second: Vec<_> = (0..=second.max_level)
        .map(|l| list_files(&files_dir.join(l.to_string())))
        .collect();
    let dims_second = tile_dimensions(&files_dir, second.max_level);

    assert_eq!(manifest_first, manifest_second);
    assert_eq!(listing_first, listing_second);
    assert_eq!(first.levels, second.levels);
    assert_eq!(dims_first, dims_second);
    assert!(dims_first.contains(&(9, "1_0.png".to_string(), (145, 257))));
}

#[test]
#[ignore = "writes a ~576 MP source and allocates about 2.3 GiB while decoding"]
fn test_source_past_default_decode_cap() {
    let dir = TempDir::new().unwrap();
    let source = write_streamed_gray_png(dir.path(), "big.png", 24_000, 24_000);

    // Tile decoding keeps the image crate's allocation cap
    assert!(decode_file(&source).is_err());

    let image = decode_source(&source).unwrap();
    assert_eq!(image.dimensions(), (24_000, 24_000));
    let v = ((300 ^ 5) & 0xFF) as u8;
    assert_eq!(image.get_pixel(300, 5).0, [v, v, v, 255]);
}

#[tokio::test]
async fn test_corrupt_source_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("broken.png");
    std::fs::write(&source, b"not an image").unwrap();
    let dest = dir.path().join("broken.dzi");

    let result = PyramidBuilder::new(BuildConfig::new(TileFormat::Png))
        .build(&source, &dest)
        .await;

    assert!(matches!(result, Err(BuildError::SourceDecode { .. })));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_unwritable_output_is_io_error() {
    let dir = TempDir::new().unwrap();
    // A regular file where the _files directory must go
    std::fs::write(dir.path().join("blocked_files"), b"").unwrap();
    let dest = dir.path().join("blocked.dzi");

    let result = PyramidBuilder::new(BuildConfig::new(TileFormat::Png))
        .build_from_image(patterned_image(10, 10), &dest)
        .await;

    assert!(matches!(result, Err(BuildError::Io { .. })));
    assert!(!dest.exists());
}
