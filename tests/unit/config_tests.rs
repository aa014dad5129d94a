// Configuration unit tests: YAML records mapped onto engine-level types

use photo_watermark::config::AppConfig;
use photo_watermark::watermark::{
    Color, GridAnchor, Placement, ResizeMethod, WatermarkConfig, WatermarkKind, WatermarkType,
};
use rstest::rstest;
use std::path::PathBuf;

#[test]
fn test_full_text_watermark_record() {
    let yaml = r##"
watermark:
  text: "© 2025 Studio"
  font_size: 48
  opacity: 200
  position_type: bottom-left
  font_family: "DejaVu Sans"
  font_bold: false
  font_italic: true
  font_style: "Oblique"
  text_color: [10, 20, 30]
  text_shadow: true
  shadow_offset: [4, -3]
  text_stroke: true
  stroke_width: 3
  stroke_color: "#123"
  rotation_angle: -30
"##;
    let config = AppConfig::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_ok());

    let spec = config.watermark.to_spec();
    assert_eq!(spec.rotation_degrees, -30.0);
    assert_eq!(spec.opacity, 200);
    assert_eq!(spec.normalized_rotation(), 330.0);

    let WatermarkKind::Text(text) = spec.kind else {
        panic!("expected a text watermark");
    };
    assert_eq!(text.content, "© 2025 Studio");
    assert_eq!(text.font_family, "DejaVu Sans");
    assert!(!text.bold);
    assert!(text.italic);
    assert_eq!(text.style_hint, "Oblique");
    assert_eq!(text.color, Color::new(10, 20, 30));
    assert_eq!(text.stroke.effective_width(), 3);
    assert_eq!(text.stroke.color, Color::new(0x11, 0x22, 0x33));
    assert_eq!(text.shadow.effective_offset(), (4, -3));
    assert!(text.font_path.is_none());

    assert_eq!(
        config.watermark.placement(),
        Placement::Grid(GridAnchor::BottomLeft)
    );
    assert!(config.watermark.resize().is_none());
}

#[test]
fn test_image_watermark_record() {
    let yaml = r#"
watermark:
  watermark_type: image
  image_watermark_path: "/tmp/logo.png"
  image_scale: 0.5
  image_opacity: 90
  opacity: 10
  use_custom_position: true
  custom_position: [30, 20]
  rotation_angle: 45
"#;
    let config = AppConfig::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_ok());

    let spec = config.watermark.to_spec();
    // image watermarks use their own opacity
    assert_eq!(spec.opacity, 90);
    match spec.kind {
        WatermarkKind::Image(image) => {
            assert_eq!(image.source_path, PathBuf::from("/tmp/logo.png"));
            assert_eq!(image.clamped_scale(), 0.5);
        }
        other => panic!("expected an image watermark, got {other:?}"),
    }
    assert_eq!(
        config.watermark.placement(),
        Placement::Custom { x: 30, y: 20 }
    );
}

#[rstest]
#[case("middle-left", GridAnchor::MiddleLeft)]
#[case("center-left", GridAnchor::MiddleLeft)]
#[case("center-right", GridAnchor::MiddleRight)]
#[case("top-center", GridAnchor::TopCenter)]
#[case("center", GridAnchor::Center)]
fn test_anchor_names(#[case] name: &str, #[case] expected: GridAnchor) {
    let yaml = format!("watermark:\n  position_type: {name}\n");
    let config = AppConfig::from_yaml_with_env(&yaml).unwrap();
    assert_eq!(config.watermark.position_type, expected);
    assert_eq!(name.parse::<GridAnchor>().unwrap(), expected);
}

#[test]
fn test_unknown_anchor_rejected() {
    assert!(AppConfig::from_yaml_with_env("watermark:\n  position_type: middle\n").is_err());
    assert!("upper-left".parse::<GridAnchor>().is_err());
}

#[test]
fn test_resize_options_from_record() {
    let config = WatermarkConfig {
        resize_enabled: true,
        resize_method: ResizeMethod::Width,
        resize_width: 80,
        keep_aspect_ratio: true,
        ..Default::default()
    };
    let resize = config.resize().unwrap();
    assert_eq!(resize.method, ResizeMethod::Width);
    assert_eq!(resize.width, 80);
    assert!(resize.keep_aspect_ratio);
}

#[rstest]
#[case(ResizeMethod::Width)]
#[case(ResizeMethod::Height)]
#[case(ResizeMethod::Percentage)]
fn test_zero_resize_target_rejected(#[case] method: ResizeMethod) {
    let config = WatermarkConfig {
        resize_enabled: true,
        resize_method: method,
        resize_width: 0,
        resize_height: 0,
        resize_percentage: 0,
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_image_type_requires_path() {
    let config = WatermarkConfig {
        watermark_type: WatermarkType::Image,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.contains("image_watermark_path"));
}

#[test]
fn test_explicit_font_path_carried_into_spec() {
    let config = WatermarkConfig {
        font_path: "/fonts/Custom.ttc".to_string(),
        font_index: 2,
        ..Default::default()
    };
    let WatermarkKind::Text(text) = config.to_spec().kind else {
        panic!("expected a text watermark");
    };
    assert_eq!(text.font_path, Some(PathBuf::from("/fonts/Custom.ttc")));
    assert_eq!(text.font_index, 2);
}

#[test]
fn test_config_file_with_env_and_fonts_section() {
    std::env::set_var("PHOTO_WATERMARK_UNIT_OWNER", "Jo");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watermark.yml");
    std::fs::write(
        &path,
        "watermark:\n  text: \"by ${PHOTO_WATERMARK_UNIT_OWNER}\"\nfonts:\n  extra_dirs: [\"./fonts\"]\n  disable_system_scan: true\n",
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    std::env::remove_var("PHOTO_WATERMARK_UNIT_OWNER");

    assert_eq!(config.watermark.text, "by Jo");
    assert_eq!(config.fonts.search_dirs(), vec![PathBuf::from("./fonts")]);
}
