// Text measurement and text layer rendering unit tests
// All cases use the built-in face so results do not depend on installed fonts

use photo_watermark::watermark::text_renderer::{measure_text, render_text_layer, TextLayout};
use photo_watermark::watermark::{Color, FontFace, ShadowOptions, StrokeOptions, TextWatermark};
use rstest::rstest;

fn builtin_text(content: &str, size: u32) -> TextWatermark {
    TextWatermark {
        content: content.to_string(),
        font_size: size,
        color: Color::white(),
        ..Default::default()
    }
}

#[test]
fn test_measure_without_rotation_is_layout_box() {
    let face = FontFace::Builtin;
    let layout = TextLayout::new("Test", &face, 16.0, 0, (0, 0)).unwrap();
    let measured = measure_text("Test", &face, 16.0, 0, (0, 0), 0.0).unwrap();

    // scale 2: four 6px cells minus the trailing gap, seven rows
    assert_eq!((layout.width, layout.height), (46, 14));
    assert_eq!((measured.width, measured.height), (46, 14));
}

#[rstest]
#[case(0, (0, 0), (46, 14))]
#[case(2, (0, 0), (50, 18))]
#[case(0, (3, 2), (49, 16))]
#[case(0, (-3, -2), (49, 16))]
#[case(1, (2, 2), (50, 18))]
fn test_stroke_and_shadow_grow_the_box(
    #[case] stroke: u32,
    #[case] shadow: (i32, i32),
    #[case] expected: (u32, u32),
) {
    let measured = measure_text("Test", &FontFace::Builtin, 16.0, stroke, shadow, 0.0).unwrap();
    assert_eq!((measured.width, measured.height), expected);
}

#[rstest]
#[case("AB", 8.0)]
#[case("Hi", 16.0)]
#[case("OK", 36.0)]
fn test_rotation_at_45_does_not_narrow_compact_text(#[case] text: &str, #[case] size: f32) {
    let face = FontFace::Builtin;
    let flat = measure_text(text, &face, size, 0, (0, 0), 0.0).unwrap();
    let rotated = measure_text(text, &face, size, 0, (0, 0), 45.0).unwrap();

    assert_ne!(flat.width, flat.height);
    assert!(rotated.width >= flat.width, "{rotated:?} vs {flat:?}");
}

#[rstest]
#[case(15.0)]
#[case(45.0)]
#[case(120.0)]
#[case(-30.0)]
fn test_rotated_box_never_loses_area(#[case] degrees: f64) {
    let face = FontFace::Builtin;
    let flat = measure_text("Watermark", &face, 24.0, 1, (2, 2), 0.0).unwrap();
    let rotated = measure_text("Watermark", &face, 24.0, 1, (2, 2), degrees).unwrap();

    let flat_area = flat.width as u64 * flat.height as u64;
    let rotated_area = rotated.width as u64 * rotated.height as u64;
    assert!(rotated_area >= flat_area);
    assert!(rotated.width.max(rotated.height) >= flat.height);
}

#[test]
fn test_quarter_turn_swaps_dimensions() {
    let face = FontFace::Builtin;
    let flat = measure_text("Test", &face, 16.0, 1, (2, 2), 0.0).unwrap();
    let turned = measure_text("Test", &face, 16.0, 1, (2, 2), 90.0).unwrap();
    assert_eq!((turned.width, turned.height), (flat.height, flat.width));
}

#[test]
fn test_empty_text_measures_zero() {
    let measured = measure_text("", &FontFace::Builtin, 36.0, 2, (2, 2), 45.0).unwrap();
    assert!(measured.is_empty());
}

#[test]
fn test_rendered_layer_matches_measurement() {
    let mut spec = builtin_text("Hi!", 16);
    spec.stroke = StrokeOptions {
        enabled: true,
        width: 2,
        color: Color::black(),
    };
    spec.shadow = ShadowOptions {
        enabled: true,
        offset_x: 3,
        offset_y: -1,
    };

    let layer = render_text_layer(&spec, &FontFace::Builtin, 200).unwrap();
    let measured = measure_text("Hi!", &FontFace::Builtin, 16.0, 2, (3, -1), 0.0).unwrap();

    assert_eq!(layer.dimensions(), (measured.width, measured.height));
    assert!(layer.pixels().any(|p| p[3] > 0));
    // corners stay clear of glyph, stroke and shadow
    assert_eq!(layer.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_fill_paints_over_stroke() {
    let mut spec = builtin_text("I", 8);
    spec.stroke = StrokeOptions {
        enabled: true,
        width: 1,
        color: Color::new(0, 0, 255),
    };

    let layer = render_text_layer(&spec, &FontFace::Builtin, 255).unwrap();
    let white = layer.pixels().filter(|p| p.0 == [255, 255, 255, 255]).count();
    let blue = layer.pixels().filter(|p| p.0 == [0, 0, 255, 255]).count();

    // 'I' lights 11 pixels; the stroke surrounds them without covering any
    assert_eq!(white, 11);
    assert!(blue > 0);
}

#[test]
fn test_empty_text_is_not_renderable() {
    assert!(render_text_layer(&builtin_text("", 16), &FontFace::Builtin, 255).is_err());
}
