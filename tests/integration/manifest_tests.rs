//! Manifest tests.
//!
//! Tests verify:
//! - The manifest carries tile size, overlap, format, size and level range
//! - The manifest is only written by successful builds

use deepzoom_builder::{BuildConfig, BuildError, PyramidBuilder, TileFormat};
use tempfile::TempDir;

use super::test_utils::{build_pyramid, patterned_image};

#[tokio::test]
async fn test_manifest_contents() {
    let built = build_pyramid(patterned_image(300, 200), TileFormat::Jpeg).await;
    let xml = built.manifest_xml();

    assert!(xml.contains("<Image "));
    assert!(xml.contains("TileSize=\"256\""));
    assert!(xml.contains("Overlap=\"1\""));
    assert!(xml.contains("Format=\"jpg\""));
    assert!(xml.contains("<Size Width=\"300\" Height=\"200\" />"));
    assert!(xml.contains("<DisplayRects>"));
    assert!(xml.contains("MinLevel=\"1\""));
    assert!(xml.contains("MaxLevel=\"9\""));
    assert!(xml.contains("<Rect X=\"0\" Y=\"0\" Width=\"300\" Height=\"200\" />"));
    assert!(xml.trim_end().ends_with("</Image>"));
}

#[tokio::test]
async fn test_manifest_path_in_report() {
    let built = build_pyramid(patterned_image(20, 20), TileFormat::Png).await;

    assert_eq!(built.report.manifest_path, built.manifest.display().to_string());
    assert!(built.report.files_dir.ends_with("pyramid_files"));
}

#[tokio::test]
async fn test_no_manifest_when_cancelled() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("cancelled.dzi");

    let builder = PyramidBuilder::new(BuildConfig::new(TileFormat::Png));
    let cancel = builder.cancel_flag();
    cancel.cancel();

    let result = builder
        .build_from_image(patterned_image(600, 600), &dest)
        .await;

    assert!(matches!(result, Err(BuildError::Cancelled { .. })));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let built = build_pyramid(patterned_image(40, 30), TileFormat::Png).await;
    let json = serde_json::to_value(&built.report).unwrap();

    assert_eq!(json["width"], 40);
    assert_eq!(json["height"], 30);
    assert_eq!(json["max_level"], 6);
    assert_eq!(json["format"], "png");
    assert_eq!(json["levels"].as_array().unwrap().len(), 7);
}
