// End-to-end watermarking scenarios

use super::test_harness::*;
use image::{DynamicImage, RgbaImage};
use photo_watermark::watermark::font_loader::open_font_file;
use photo_watermark::watermark::processor::SkipReason;
use photo_watermark::watermark::raster::{alpha_composite, composite_at, rotate_expanded};
use photo_watermark::watermark::{
    FontSource, GridAnchor, ImageWatermark, Placement, PlacementPosition, ResizeMethod,
    ResizeOptions, TextWatermark, WatermarkConfig, WatermarkEngine, WatermarkError,
    WatermarkSpec, WatermarkType,
};
use rstest::rstest;

#[rstest]
#[case(ResizeOptions { method: ResizeMethod::Percentage, percentage: 50, ..Default::default() }, (100, 50))]
#[case(ResizeOptions { method: ResizeMethod::Width, width: 80, keep_aspect_ratio: true, ..Default::default() }, (80, 40))]
#[case(ResizeOptions { method: ResizeMethod::Height, height: 50, keep_aspect_ratio: true, ..Default::default() }, (100, 50))]
#[case(ResizeOptions { method: ResizeMethod::Width, width: 80, keep_aspect_ratio: false, ..Default::default() }, (80, 100))]
fn test_resize_before_watermark(#[case] resize: ResizeOptions, #[case] expected: (u32, u32)) {
    let engine = builtin_engine();
    let spec = WatermarkSpec::text(text("Hi", 8));

    let outcome = engine
        .apply(
            &red_photo(200, 100),
            &spec,
            Placement::Grid(GridAnchor::Center),
            Some(&resize),
        )
        .unwrap();

    assert_eq!((outcome.image.width(), outcome.image.height()), expected);
    assert!(outcome.is_applied());
}

#[test]
fn test_resize_by_height_with_image_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let logo = write_logo(dir.path(), &small_logo());

    let config = WatermarkConfig {
        watermark_type: WatermarkType::Image,
        image_watermark_path: logo.display().to_string(),
        image_opacity: 255,
        resize_enabled: true,
        resize_method: ResizeMethod::Height,
        resize_height: 50,
        keep_aspect_ratio: true,
        ..Default::default()
    };

    let outcome = builtin_engine()
        .apply_watermark(&red_photo(200, 100), &config)
        .unwrap();

    assert_eq!((outcome.image.width(), outcome.image.height()), (100, 50));
    assert_eq!(
        (outcome.layer_size.width, outcome.layer_size.height),
        (8, 4)
    );
    assert!(outcome.is_applied());
}

#[rstest]
#[case::builtin_face(WatermarkEngine::isolated())]
#[case::installed_fonts(WatermarkEngine::system())]
fn test_bottom_right_text_sits_at_margin(#[case] engine: WatermarkEngine) {
    let spec = WatermarkSpec::text(text("Test", 36));

    let outcome = engine
        .apply(
            &gradient_photo(800, 600),
            &spec,
            Placement::Grid(GridAnchor::BottomRight),
            None,
        )
        .unwrap();

    let center = outcome.center.unwrap();
    let size = outcome.layer_size;
    let right = center.x + (size.width - size.width / 2) as i32;
    let bottom = center.y + (size.height - size.height / 2) as i32;

    assert!((right - (800 - 20)).abs() <= 1, "right edge at {right}");
    assert!((bottom - (600 - 20)).abs() <= 1, "bottom edge at {bottom}");
    assert_ne!(outcome.image.to_rgba8(), gradient_photo(800, 600).to_rgba8());
}

#[test]
fn test_rotated_image_watermark_matches_manual_composite() {
    let dir = tempfile::tempdir().unwrap();
    let logo = small_logo();
    let logo_path = write_logo(dir.path(), &logo);
    let base = red_photo(200, 100);

    let spec = WatermarkSpec::image(ImageWatermark {
        source_path: logo_path,
        scale: 1.0,
    })
    .with_opacity(255)
    .with_rotation(45.0);

    let outcome = builtin_engine()
        .apply(&base, &spec, Placement::Custom { x: 30, y: 20 }, None)
        .unwrap();

    // rotate with expansion, then blend at the clamped center's top-left
    let rotated = rotate_expanded(&logo, 45.0);
    assert_eq!(rotated.dimensions(), (9, 9));
    let mut overlay = RgbaImage::new(200, 100);
    composite_at(&mut overlay, &rotated, 30 - 4, 20 - 4);
    let mut expected = base.to_rgba8();
    alpha_composite(&mut expected, &overlay);

    assert_eq!(outcome.center, Some(PlacementPosition::new(30, 20)));
    assert_eq!(outcome.image.to_rgba8().as_raw(), expected.as_raw());
}

#[test]
fn test_unknown_family_still_yields_usable_font() {
    let engine = WatermarkEngine::system();
    let request = TextWatermark {
        font_family: "No Such Family 7f3a".to_string(),
        bold: true,
        italic: true,
        ..Default::default()
    };

    let font = engine.load_font(&request);
    match &font.source {
        FontSource::File { path, index } => {
            assert!(path.is_file(), "{} does not exist", path.display());
            assert!(open_font_file(path, *index).is_ok());
        }
        FontSource::Builtin => {}
    }
    assert!(!font.face.text_bounds("Test", 36.0).is_empty());
}

#[test]
fn test_zero_rotation_renders_unrotated_layout() {
    let engine = builtin_engine();
    let flat = WatermarkSpec::text(text("Test", 16));

    let measured = engine.measure(&flat).unwrap();
    let layer = engine.render(&flat).unwrap().into_rendered().unwrap();
    assert_eq!(layer.layer.dimensions(), (measured.width, measured.height));

    let full_turn = flat.clone().with_rotation(360.0);
    let turned = engine.render(&full_turn).unwrap().into_rendered().unwrap();
    assert_eq!(turned.layer.as_raw(), layer.layer.as_raw());
}

#[test]
fn test_measure_matches_rendered_layer_when_rotated() {
    let engine = builtin_engine();
    for degrees in [0.0, 30.0, 90.0, 135.0, 200.0] {
        let spec = WatermarkSpec::text(text("Sample", 24)).with_rotation(degrees);
        let measured = engine.measure(&spec).unwrap();
        let rendered = engine.render(&spec).unwrap().into_rendered().unwrap();
        assert_eq!(
            rendered.layer.dimensions(),
            (measured.width, measured.height),
            "rotation {degrees}"
        );
    }
}

#[test]
fn test_layer_outside_canvas_leaves_pixels_untouched() {
    let engine = builtin_engine();
    let base = gradient_photo(120, 80);
    let spec = WatermarkSpec::text(text("Far away", 16)).with_opacity(255);

    let outcome = engine
        .composite(&base, &spec, PlacementPosition::new(5_000, -5_000))
        .unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::OutsideCanvas));
    assert!(matches!(outcome.image, DynamicImage::ImageRgb8(_)));
    assert_eq!(outcome.image.as_bytes(), base.as_bytes());
}

#[test]
fn test_missing_watermark_file_returns_base() {
    let dir = tempfile::tempdir().unwrap();
    let base = gradient_photo(64, 48);
    let spec = WatermarkSpec::image(ImageWatermark {
        source_path: dir.path().join("gone.png"),
        scale: 1.0,
    });

    let outcome = builtin_engine()
        .apply(&base, &spec, Placement::Grid(GridAnchor::TopLeft), None)
        .unwrap();

    assert!(matches!(
        outcome.skipped,
        Some(SkipReason::SourceUnreadable { .. })
    ));
    assert_eq!(outcome.image.as_bytes(), base.as_bytes());
}

#[test]
fn test_corrupt_watermark_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really").unwrap();

    let spec = WatermarkSpec::image(ImageWatermark {
        source_path: path,
        scale: 1.0,
    });
    let err = builtin_engine()
        .apply(&gradient_photo(64, 48), &spec, Placement::Grid(GridAnchor::Center), None)
        .unwrap_err();

    assert!(matches!(err, WatermarkError::Decode(_)));
}

#[test]
fn test_empty_text_is_skipped() {
    let base = gradient_photo(64, 48);
    let outcome = builtin_engine()
        .apply(
            &base,
            &WatermarkSpec::text(text("", 24)),
            Placement::Grid(GridAnchor::Center),
            None,
        )
        .unwrap();

    assert_eq!(outcome.skipped, Some(SkipReason::EmptyText));
    assert_eq!(outcome.image.as_bytes(), base.as_bytes());
}

#[test]
fn test_oversized_watermark_is_centered() {
    let engine = builtin_engine();
    let spec = WatermarkSpec::text(text("A much longer watermark", 40));

    let outcome = engine
        .apply(
            &gradient_photo(100, 60),
            &spec,
            Placement::Grid(GridAnchor::TopLeft),
            None,
        )
        .unwrap();

    assert!(outcome.layer_size.width > 100);
    assert_eq!(outcome.center.unwrap().x, 50);
    assert!(outcome.is_applied());
}
