use super::*;
use serde_json::json;

#[test]
fn parser_aliases_and_defaults_are_accepted() {
    let layer: SourceLayer = serde_json::from_value(json!({
        "name": "Logo",
        "type": "shape",
        "bounds": {"top": 10.0, "left": 20.0, "right": 120.0, "bottom": 60.0, "width": 100.0, "height": 50.0},
        "vectorMask": {"paths": [{"type": "path", "knots": [{"x": 20.0, "y": 10.0}]}]}
    }))
    .unwrap();

    assert_eq!(layer.kind, LayerKind::Vector);
    assert_eq!(layer.bounds, Bounds::new(20.0, 10.0, 100.0, 50.0));
    assert_eq!(layer.opacity, 1.0);
    assert_eq!(layer.blend_mode, "normal");
    assert!(layer.visible);
    assert!(!layer.clipping);
    assert_eq!(layer.active_vector_paths().map(<[_]>::len), Some(1));
    assert!(matches!(layer.role(), LayerRole::Shape));
}

#[test]
fn text_kind_without_payload_is_a_shape() {
    let layer = SourceLayer {
        kind: LayerKind::Text,
        ..SourceLayer::default()
    };
    assert!(matches!(layer.role(), LayerRole::Shape));
}

#[test]
fn mask_default_color_defaults_to_visible() {
    let mask: SourceLayerMask =
        serde_json::from_value(json!({"bounds": {"x": 0.0, "y": 0.0, "width": 4.0, "height": 4.0}}))
            .unwrap();
    assert_eq!(mask.default_color, 255);
    assert!(!mask.hides_outside());
}

#[test]
fn raster_refs_decode_inline_base64_and_streamed_names() {
    let inline: RasterRef = serde_json::from_value(json!({"inline": "AQID"})).unwrap();
    assert_eq!(inline, RasterRef::Inline(vec![1, 2, 3]));

    let streamed: RasterRef = serde_json::from_value(json!({"streamed": "Logo_3.png"})).unwrap();
    assert_eq!(streamed, RasterRef::Streamed("Logo_3.png".to_owned()));

    assert!(serde_json::from_value::<RasterRef>(json!({"inline": "@@@"})).is_err());
}

#[test]
fn knot_handles_default_to_anchor() {
    let k = Knot {
        x: 5.0,
        y: 6.0,
        after_x: Some(9.0),
        ..Knot::default()
    };
    assert_eq!(k.before(), k.anchor());
    assert_eq!(k.after(), Vec2::new(9.0, 6.0));
}

#[test]
fn text_rotation_falls_back_to_matrix() {
    let t = SourceTextTransform {
        xx: 0.0,
        xy: 1.0,
        yx: -1.0,
        yy: 0.0,
        tx: 0.0,
        ty: 0.0,
        rotation: None,
        scale_x: None,
        scale_y: None,
    };
    assert!((t.rotation_degrees() - 90.0).abs() < 1e-9);
    assert_eq!(t.scale(), (1.0, 1.0));
}

#[test]
fn adjustment_keeps_unknown_parameters() {
    let adj: SourceAdjustment =
        serde_json::from_value(json!({"type": "levels", "gamma": 1.2, "inputBlack": 4})).unwrap();
    assert_eq!(adj.kind, "levels");
    assert_eq!(adj.params.get("gamma"), Some(&json!(1.2)));
    assert_eq!(adj.params.len(), 2);
}
