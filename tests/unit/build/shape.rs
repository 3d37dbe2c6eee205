use super::*;
use crate::build::images::ImageExport;
use crate::foundation::core::{Bounds, Rgba};
use crate::source::model::{Knot, RasterRef, SourceSubpath, SourceVectorMask};
use serde_json::json;

fn vector_layer(points: Vec<Knot>) -> SourceLayer {
    SourceLayer {
        name: "Badge".to_owned(),
        kind: LayerKind::Vector,
        bounds: Bounds::new(10.0, 10.0, 20.0, 20.0),
        vector_mask: Some(SourceVectorMask {
            enabled: true,
            paths: vec![SourceSubpath {
                points,
                ..SourceSubpath::default()
            }],
        }),
        ..SourceLayer::default()
    }
}

fn k(x: f64, y: f64) -> Knot {
    Knot {
        x,
        y,
        ..Knot::default()
    }
}

#[test]
fn vector_layer_gets_local_path_and_fill() {
    let mut layer = vector_layer(vec![k(10.0, 10.0), k(30.0, 10.0), k(30.0, 30.0)]);
    layer.vector_fill = Some(
        serde_json::from_value(json!({"type": "solid", "color": {"r": 255, "g": 0, "b": 0}}))
            .unwrap(),
    );
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();

    let built = build_shape(&layer, &mut sink, true).unwrap();
    assert!(built.name_suffix.is_none());
    let NodeKind::Vector(data) = built.kind else {
        panic!("expected vector kind");
    };
    assert_eq!(
        data.vector_path.unwrap().path_data,
        "M 0.00 0.00 L 20.00 0.00 L 20.00 20.00 Z"
    );
    assert_eq!(
        data.vector_fill,
        Some(VectorFill::Solid {
            color: Rgba::new(1.0, 0.0, 0.0, 1.0)
        })
    );
}

#[test]
fn broken_knots_fall_back_to_rectangle_with_suffix() {
    let layer = vector_layer(vec![k(f64::NAN, 10.0), k(30.0, 10.0), k(30.0, 30.0)]);
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();
    let built = build_shape(&layer, &mut sink, true).unwrap();
    assert_eq!(built.name_suffix, Some(VECTOR_FAILED_SUFFIX));
    let NodeKind::Vector(data) = built.kind else {
        panic!("expected vector kind");
    };
    assert!(data.vector_path.is_none());
}

#[test]
fn images_are_exported_only_when_enabled() {
    let layer = SourceLayer {
        name: "Photo".to_owned(),
        image: Some(RasterRef::Inline(vec![1, 2, 3])),
        ..SourceLayer::default()
    };
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();

    let built = build_shape(&layer, &mut sink, false).unwrap();
    let NodeKind::Rectangle(data) = built.kind else {
        panic!("expected rectangle kind");
    };
    assert!(data.image.is_none());

    let built = build_shape(&layer, &mut sink, true).unwrap();
    let NodeKind::Rectangle(data) = built.kind else {
        panic!("expected rectangle kind");
    };
    assert_eq!(data.image.unwrap().file_name, "Photo_0.png");
}

#[test]
fn zero_width_stroke_and_pattern_fill_are_dropped() {
    let stroke: SourceVectorStroke =
        serde_json::from_value(json!({"color": {"r": 0, "g": 0, "b": 0}, "width": 0.0})).unwrap();
    assert!(vector_stroke(&stroke).is_none());
    assert!(vector_fill(&SourceVectorFill::Pattern).is_none());
}
