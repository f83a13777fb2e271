//! Geometry property tests.
//!
//! Tests verify, over a spread of image sizes:
//! - The level formula and level bounds
//! - The top-level grid covers the whole image without gaps
//! - Tiles touching x=0 / y=0 start exactly at 0
//! - Neighboring tiles overlap on interior edges

use deepzoom_builder::{
    level_bounds, max_level, tile_grid, GeometryError, PyramidGeometry, Rect, TILE_OVERLAP,
    TILE_SIZE,
};

const SIZES: [(u32, u32); 10] = [
    (1, 1),
    (2, 1),
    (255, 255),
    (256, 256),
    (257, 100),
    (300, 200),
    (512, 512),
    (513, 1),
    (1000, 777),
    (4096, 4097),
];

#[test]
fn test_max_level_formula() {
    for (w, h) in SIZES {
        let expected = (w.max(h) as f64).log2().ceil() as u32;
        assert_eq!(max_level(w, h).unwrap(), expected, "{}x{}", w, h);
    }
}

#[test]
fn test_zero_dimension_rejected() {
    assert!(matches!(
        PyramidGeometry::new(0, 5),
        Err(GeometryError::InvalidDimension { width: 0, height: 5 })
    ));
}

#[test]
fn test_level_zero_is_single_pixel() {
    for (w, h) in SIZES {
        let geometry = PyramidGeometry::new(w, h).unwrap();
        let level0 = geometry.level(0);
        assert_eq!(level0.bounds, Rect::new(0, 0, 1, 1), "{}x{}", w, h);
        assert_eq!(level0.tile_count(), 1);
    }
}

#[test]
fn test_each_level_halves_rounding_up() {
    for (w, h) in SIZES {
        let top = max_level(w, h).unwrap();
        for level in 0..top {
            let upper = level_bounds(w, h, top, level + 1);
            let lower = level_bounds(w, h, top, level);
            assert_eq!(lower.width, (upper.width + 1) / 2);
            assert_eq!(lower.height, (upper.height + 1) / 2);
        }
    }
}

#[test]
fn test_top_level_covers_image_without_gaps() {
    for (w, h) in SIZES {
        let geometry = PyramidGeometry::new(w, h).unwrap();
        let top = geometry.level(geometry.max_level);
        assert_eq!((top.max_col, top.max_row), tile_grid(w, h, TILE_SIZE));

        let mut covered_cols = vec![false; w as usize];
        let mut covered_rows = vec![false; h as usize];

        for (col, row) in top.tiles() {
            let rect = top.tile_rect(col, row);
            assert!(!rect.is_empty(), "{}x{} tile {}_{} is empty", w, h, col, row);
            assert!(rect.x >= 0 && rect.y >= 0);
            assert!(rect.right() <= w as i64 && rect.bottom() <= h as i64);

            for x in rect.x..rect.right() {
                covered_cols[x as usize] = true;
            }
            for y in rect.y..rect.bottom() {
                covered_rows[y as usize] = true;
            }
        }

        assert!(covered_cols.iter().all(|&c| c), "{}x{} column gap", w, h);
        assert!(covered_rows.iter().all(|&c| c), "{}x{} row gap", w, h);
    }
}

#[test]
fn test_edge_tiles_start_at_zero() {
    let geometry = PyramidGeometry::new(1000, 777).unwrap();
    let top = geometry.level(geometry.max_level);

    for row in 0..=top.max_row {
        assert_eq!(top.tile_rect(0, row).x, 0);
    }
    for col in 0..=top.max_col {
        assert_eq!(top.tile_rect(col, 0).y, 0);
    }
}

#[test]
fn test_interior_edges_overlap() {
    let geometry = PyramidGeometry::new(1000, 777).unwrap();
    let top = geometry.level(geometry.max_level);
    let ov = TILE_OVERLAP as i64;

    for row in 0..=top.max_row {
        for col in 1..=top.max_col {
            let left = top.tile_rect(col - 1, row);
            let right = top.tile_rect(col, row);

            assert_eq!(right.x, col as i64 * TILE_SIZE as i64 - ov);
            assert!(right.x < left.right(), "tiles {} and {} do not overlap", col - 1, col);
            assert!(left.intersects(&right));
        }
    }
}

#[test]
fn test_every_lower_tile_has_contributors() {
    for (w, h) in SIZES {
        let geometry = PyramidGeometry::new(w, h).unwrap();
        for level in 0..geometry.max_level {
            let target = geometry.level(level);
            let upper = geometry.level(level + 1);
            for (col, row) in target.tiles() {
                let contributors = target.contributing_tiles(col, row, &upper);
                assert!(
                    !contributors.is_empty(),
                    "{}x{} level {} tile {}_{} has no upper tiles",
                    w,
                    h,
                    level,
                    col,
                    row
                );
                for (tx, ty, _) in contributors {
                    assert!(upper.contains_tile(tx, ty));
                }
            }
        }
    }
}
