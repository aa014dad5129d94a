// Placement geometry unit tests

use photo_watermark::watermark::position::visible_region;
use photo_watermark::watermark::{
    clamp_center, compute_placement, grid_position, rotated_bounds, top_left_for_center,
    GridAnchor, ImageDimensions, Placement, PlacementPosition, WatermarkDimensions, GRID_MARGIN,
};
use rstest::rstest;

fn canvas(width: u32, height: u32) -> ImageDimensions {
    ImageDimensions { width, height }
}

#[test]
fn test_bottom_right_keeps_margin_from_both_edges() {
    let image = canvas(800, 600);
    let wm = WatermarkDimensions::new(101, 51);

    let center = grid_position(&image, &wm, GridAnchor::BottomRight, GRID_MARGIN);
    let top_left = top_left_for_center(center, &wm);

    assert_eq!(top_left.x + wm.width as i32, 800 - 20);
    assert_eq!(top_left.y + wm.height as i32, 600 - 20);
}

#[test]
fn test_top_left_keeps_margin_from_both_edges() {
    let image = canvas(800, 600);
    let wm = WatermarkDimensions::new(101, 51);

    let center = grid_position(&image, &wm, GridAnchor::TopLeft, GRID_MARGIN);
    let top_left = top_left_for_center(center, &wm);

    assert_eq!(top_left, PlacementPosition::new(20, 20));
}

#[test]
fn test_center_anchor_uses_canvas_midpoint() {
    let center = grid_position(
        &canvas(800, 600),
        &WatermarkDimensions::new(100, 50),
        GridAnchor::Center,
        GRID_MARGIN,
    );
    assert_eq!(center, PlacementPosition::new(400, 300));
}

#[rstest]
#[case(GridAnchor::TopLeft, GridAnchor::TopRight)]
#[case(GridAnchor::MiddleLeft, GridAnchor::MiddleRight)]
#[case(GridAnchor::BottomLeft, GridAnchor::BottomRight)]
fn test_grid_left_right_are_mirror_images(#[case] left: GridAnchor, #[case] right: GridAnchor) {
    for (cw, ch) in [(800, 600), (801, 601), (123, 77)] {
        for (ww, wh) in [(100, 50), (33, 17), (1, 1), (60, 40)] {
            let image = canvas(cw, ch);
            let wm = WatermarkDimensions::new(ww, wh);
            let l = grid_position(&image, &wm, left, GRID_MARGIN);
            let r = grid_position(&image, &wm, right, GRID_MARGIN);

            assert_eq!(l.y, r.y);
            let mirrored = cw as i32 - l.x;
            assert!(
                (mirrored - r.x).abs() <= 1,
                "canvas {cw}x{ch}, watermark {ww}x{wh}: left {} right {}",
                l.x,
                r.x
            );
        }
    }
}

#[test]
fn test_oversized_watermark_collapses_to_midpoint() {
    let image = canvas(100, 80);
    let wm = WatermarkDimensions::new(300, 20);

    for anchor in GridAnchor::ALL {
        let center = grid_position(&image, &wm, anchor, GRID_MARGIN);
        assert_eq!(center.x, 50, "{}", anchor.as_str());
    }
}

#[test]
fn test_clamp_keeps_box_inside_canvas() {
    let requests = [
        (-1000, -1000),
        (0, 0),
        (5, 500),
        (399, 299),
        (10_000, 3),
        (i32::MIN, i32::MAX),
    ];

    for (cw, ch) in [(800, 600), (21, 13), (1, 1)] {
        for (ww, wh) in [(1, 1), (10, 7), (cw, ch), (cw / 2 + 1, ch / 3 + 1)] {
            let image = canvas(cw, ch);
            let wm = WatermarkDimensions::new(ww.min(cw), wh.min(ch));
            for (x, y) in requests {
                let center = clamp_center(PlacementPosition::new(x, y), &image, &wm);
                let tl = top_left_for_center(center, &wm);
                assert!(tl.x >= 0 && tl.y >= 0, "{tl:?} for {wm:?} on {image:?}");
                assert!(tl.x as i64 + wm.width as i64 <= cw as i64);
                assert!(tl.y as i64 + wm.height as i64 <= ch as i64);
            }
        }
    }
}

#[test]
fn test_custom_placement_is_center_and_unclamped_when_inside() {
    let center = compute_placement(
        &canvas(200, 100),
        &WatermarkDimensions::new(9, 9),
        Placement::Custom { x: 30, y: 20 },
        GRID_MARGIN,
    );
    assert_eq!(center, PlacementPosition::new(30, 20));
}

#[rstest]
#[case(8, 4, 0.0, (8, 4))]
#[case(8, 4, 90.0, (4, 8))]
#[case(8, 4, 180.0, (8, 4))]
#[case(8, 4, -90.0, (4, 8))]
#[case(8, 4, 720.0, (8, 4))]
#[case(8, 4, 45.0, (9, 9))]
#[case(100, 100, 45.0, (142, 142))]
fn test_rotated_bounds(
    #[case] w: u32,
    #[case] h: u32,
    #[case] degrees: f64,
    #[case] expected: (u32, u32),
) {
    let bounds = rotated_bounds(w, h, degrees);
    assert_eq!((bounds.width, bounds.height), expected);
}

#[test]
fn test_visible_region_clips_to_canvas() {
    let region = visible_region(
        PlacementPosition::new(-5, 90),
        &canvas(200, 100),
        &WatermarkDimensions::new(20, 20),
    )
    .unwrap();

    assert_eq!((region.x, region.y), (0, 90));
    assert_eq!((region.width, region.height), (15, 10));
}

#[test]
fn test_visible_region_none_when_disjoint() {
    let image = canvas(200, 100);
    let wm = WatermarkDimensions::new(20, 20);
    assert!(visible_region(PlacementPosition::new(200, 0), &image, &wm).is_none());
    assert!(visible_region(PlacementPosition::new(-20, -20), &image, &wm).is_none());
}
