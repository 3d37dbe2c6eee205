use super::*;
use serde_json::json;

fn no_export(_: &RasterRef) -> Option<crate::scene::model::ImageRef> {
    None
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn offset_follows_angle_and_distance() {
    let v = shadow_offset_from_angle_distance(90.0, 10.0);
    assert!(close(v.x, 0.0));
    assert!(close(v.y, 10.0));

    let v = shadow_offset_from_angle_distance(180.0, 4.0);
    assert!(close(v.x, -4.0));
    assert!(close(v.y, 0.0));
}

#[test]
fn non_finite_offset_input_is_zero() {
    assert_eq!(shadow_offset_from_angle_distance(f64::NAN, 5.0), Vec2::ZERO);
    assert_eq!(shadow_offset_from_angle_distance(45.0, f64::INFINITY), Vec2::ZERO);
}

#[test]
fn gradient_transform_rotates_about_center() {
    let t = linear_gradient_transform(0.0);
    assert_eq!(t, [[1.0, 0.0, 0.0], [-0.0, 1.0, 0.0]]);

    let t = linear_gradient_transform(90.0);
    // The center maps onto itself for any angle.
    let cx = t[0][0] * 0.5 + t[0][1] * 0.5 + t[0][2];
    let cy = t[1][0] * 0.5 + t[1][1] * 0.5 + t[1][2];
    assert!(close(cx, 0.5) && close(cy, 0.5));
    assert!(close(t[0][1], 1.0) && close(t[1][0], -1.0));

    assert_eq!(linear_gradient_transform(f64::NAN), linear_gradient_transform(0.0));
}

#[test]
fn stops_convert_reverse_and_scale() {
    let stops = vec![
        SourceGradientStop {
            location: 0.0,
            color: RawColor::rgb(255.0, 0.0, 0.0),
        },
        SourceGradientStop {
            location: 25.0,
            color: RawColor::rgb(0.0, 0.0, 255.0),
        },
    ];

    let plain = gradient_stops(&stops, false, 100.0);
    assert_eq!(plain[0].position, 0.0);
    assert_eq!(plain[1].position, 0.25);
    assert_eq!(plain[0].color, Rgba::new(1.0, 0.0, 0.0, 1.0));

    let reversed = gradient_stops(&stops, true, 100.0);
    assert_eq!(reversed[0].position, 0.75);
    assert_eq!(reversed[0].color, Rgba::new(0.0, 0.0, 1.0, 1.0));
    assert_eq!(reversed[1].position, 1.0);

    let half = gradient_stops(&stops, false, 50.0);
    assert_eq!(half[0].position, 0.25);
    assert_eq!(half[1].position, 0.375);
}

#[test]
fn disabled_effects_are_dropped_and_cardinality_kept() {
    let src: SourceEffects = serde_json::from_value(json!({
        "dropShadow": [
            {"enabled": true, "color": {"r": 255, "g": 0, "b": 0}, "distance": 5.0, "blur": 3.0},
            {"enabled": false, "color": {"r": 0, "g": 0, "b": 0}}
        ],
        "innerShadow": [
            {"color": {"r": 0, "g": 0, "b": 0}, "opacity": 0.5},
            {"color": {"r": 0, "g": 0, "b": 0}, "opacity": 0.25}
        ],
        "outerGlow": {"enabled": false, "color": {"r": 0, "g": 0, "b": 0}},
        "gaussianBlur": {"radius": 6.0},
        "solidFill": {"color": "#00ff00", "opacity": 0.5, "blendMode": "multiply"}
    }))
    .unwrap();

    let fx = normalize_effects(&src, &mut no_export);

    let Some(OneOrMany::One(shadow)) = &fx.drop_shadow else {
        panic!("expected a single drop shadow, got {:?}", fx.drop_shadow);
    };
    assert_eq!(shadow.color, Rgba::new(1.0, 0.0, 0.0, DEFAULT_SHADOW_OPACITY));
    let expect = shadow_offset_from_angle_distance(DEFAULT_SHADOW_ANGLE, 5.0);
    assert!(close(shadow.offset.x, expect.x) && close(shadow.offset.y, expect.y));

    assert!(matches!(&fx.inner_shadow, Some(OneOrMany::Many(v)) if v.len() == 2));
    assert!(fx.outer_glow.is_none());
    assert_eq!(fx.layer_blur, Some(LayerBlur { radius: 6.0 }));

    let fill = fx.solid_fill.unwrap();
    assert_eq!(fill.color, Rgba::new(0.0, 1.0, 0.0, 0.5));
    assert_eq!(fill.blend_mode, BlendMode::Multiply);
}

#[test]
fn gradient_stroke_drops_solid_color() {
    let src: SourceEffects = serde_json::from_value(json!({
        "stroke": {
            "color": {"r": 1, "g": 1, "b": 1},
            "size": 2.0,
            "position": "outside",
            "fillType": "gradient",
            "gradient": {"angle": 45.0, "type": "linear", "colors": [
                {"location": 0, "color": {"r": 0, "g": 0, "b": 0}},
                {"location": 100, "color": {"r": 255, "g": 255, "b": 255}}
            ]}
        }
    }))
    .unwrap();
    let fx = normalize_effects(&src, &mut no_export);
    let stroke = fx.stroke.as_ref().and_then(OneOrMany::first).unwrap();
    assert!(stroke.color.is_none());
    assert_eq!(stroke.gradient.as_ref().map(|g| g.stops.len()), Some(2));
    assert_eq!(stroke.position, StrokeAlign::Outside);
}

#[test]
fn pattern_payload_goes_through_the_exporter() {
    let src: SourceEffects = serde_json::from_value(json!({
        "patternOverlay": {"opacity": 0.5, "blendMode": "normal", "patternName": "dots",
                           "pattern": {"streamed": "dots.png"}}
    }))
    .unwrap();
    let mut seen = Vec::new();
    let mut export = |r: &RasterRef| {
        seen.push(r.clone());
        Some(crate::scene::model::ImageRef {
            file_name: "Layer_pattern_1.png".to_owned(),
            data: None,
        })
    };
    let fx = normalize_effects(&src, &mut export);
    let p = fx.pattern_overlay.unwrap();
    assert_eq!(p.image.unwrap().file_name, "Layer_pattern_1.png");
    assert_eq!(seen, vec![RasterRef::Streamed("dots.png".to_owned())]);
}
