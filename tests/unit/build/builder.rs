use super::*;
use crate::source::model::{Knot, SourceLayerMask, SourceSubpath, SourceVectorMask};
use serde_json::json;

fn doc(layers: serde_json::Value) -> SourceDocument {
    serde_json::from_value(json!({
        "name": "Poster",
        "width": 400,
        "height": 300,
        "layers": layers,
    }))
    .unwrap()
}

fn build(layers: serde_json::Value) -> Conversion {
    SceneBuilder::default().build(&doc(layers)).unwrap()
}

fn frame(node: &TargetNode) -> &FrameData {
    match &node.kind {
        NodeKind::Frame(f) => f,
        other => panic!("expected frame, got {other:?}"),
    }
}

#[test]
fn clipping_group_is_sized_to_base_with_offsets() {
    let out = build(json!([
        {"name": "A", "type": "image", "bounds": {"x": 10, "y": 10, "width": 100, "height": 50}},
        {"name": "B", "type": "image", "clipping": true,
         "bounds": {"x": 20, "y": 15, "width": 30, "height": 30}},
    ]));
    let nodes = &out.document.nodes;
    assert_eq!(nodes.len(), 1);
    let container = &nodes[0];
    assert_eq!(container.name, "A [Clipping Group]");
    assert_eq!(
        (container.x, container.y, container.width, container.height),
        (10.0, 10.0, 100.0, 50.0)
    );
    let f = frame(container);
    assert_eq!(f.role, FrameRole::ClippingGroup);
    assert!(f.clips_content);

    let names: Vec<_> = f.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["A [Clip Mask]", "A", "B"]);
    assert!(matches!(
        f.children[0].kind,
        NodeKind::Mask(MaskData {
            source: MaskSource::Rect
        })
    ));
    assert_eq!((f.children[1].x, f.children[1].y), (0.0, 0.0));
    assert_eq!((f.children[2].x, f.children[2].y), (10.0, 5.0));
}

#[test]
fn vector_base_gives_path_shaped_clip_mask() {
    let out = build(json!([
        {"name": "Blob", "type": "vector", "bounds": {"x": 0, "y": 0, "width": 20, "height": 20},
         "vectorMask": {"paths": [{"points": [
            {"x": 0, "y": 0}, {"x": 20, "y": 0}, {"x": 20, "y": 20}
         ]}]}},
        {"name": "Tint", "type": "image", "clipping": true,
         "bounds": {"x": 0, "y": 0, "width": 20, "height": 20}},
    ]));
    let f = frame(&out.document.nodes[0]);
    let NodeKind::Mask(MaskData {
        source: MaskSource::Path { path_data, .. },
    }) = &f.children[0].kind
    else {
        panic!("expected path mask");
    };
    assert!(path_data.starts_with("M 0.00 0.00"));
}

#[test]
fn lone_clipping_layer_is_emitted_standalone() {
    let out = build(json!([
        {"name": "Orphan", "type": "image", "clipping": true,
         "bounds": {"x": 5, "y": 5, "width": 10, "height": 10}},
    ]));
    assert_eq!(out.document.nodes.len(), 1);
    assert_eq!(out.document.nodes[0].name, "Orphan");
    assert_eq!(out.document.nodes[0].type_name(), "RECTANGLE");
}

#[test]
fn mask_that_reveals_outside_is_ignored() {
    let out = build(json!([
        {"name": "Photo", "type": "image", "bounds": {"x": 0, "y": 0, "width": 50, "height": 50},
         "mask": {"bounds": {"x": 10, "y": 10, "width": 20, "height": 20}, "defaultColor": 255}},
        {"name": "Empty", "type": "image", "bounds": {"x": 0, "y": 0, "width": 50, "height": 50},
         "mask": {"bounds": {"x": 10, "y": 10, "width": 0, "height": 0}, "defaultColor": 0}},
    ]));
    for node in &out.document.nodes {
        assert_eq!(node.type_name(), "RECTANGLE");
    }
}

#[test]
fn hiding_mask_wraps_content_in_mask_frame() {
    let out = build(json!([
        {"name": "Photo", "type": "image", "opacity": 0.5, "blendMode": "multiply",
         "bounds": {"x": 0, "y": 0, "width": 50, "height": 50},
         "mask": {"bounds": {"x": 10, "y": 20, "width": 20, "height": 20}, "defaultColor": 0,
                  "image": {"inline": "AQID"}}},
    ]));
    let wrapper = &out.document.nodes[0];
    assert_eq!(wrapper.name, "Photo");
    assert_eq!((wrapper.x, wrapper.y), (10.0, 20.0));
    assert_eq!(wrapper.opacity, 0.5);
    assert_eq!(wrapper.blend_mode, BlendMode::Multiply);

    let f = frame(wrapper);
    assert_eq!(f.role, FrameRole::LayerMask);
    assert_eq!(f.children.len(), 2);
    let NodeKind::Mask(MaskData {
        source: MaskSource::Luminance { image },
    }) = &f.children[0].kind
    else {
        panic!("expected luminance mask");
    };
    assert_eq!(image.file_name, "Photo_mask_0.png");

    let content = &f.children[1];
    assert_eq!((content.x, content.y), (-10.0, -20.0));
    assert_eq!(content.opacity, 1.0);
    assert_eq!(content.blend_mode, BlendMode::Normal);
    assert!(out.images.contains_key("Photo_mask_0.png"));
}

#[test]
fn masked_vector_keeps_failed_suffix_on_content() {
    let knot = |x: f64, y: f64| Knot {
        x,
        y,
        ..Knot::default()
    };
    let star = SourceLayer {
        name: "Star".to_owned(),
        kind: LayerKind::Vector,
        bounds: Bounds::new(0.0, 0.0, 40.0, 40.0),
        vector_mask: Some(SourceVectorMask {
            enabled: true,
            paths: vec![SourceSubpath {
                points: vec![knot(f64::NAN, 0.0), knot(40.0, 0.0), knot(40.0, 40.0)],
                ..SourceSubpath::default()
            }],
        }),
        mask: Some(SourceLayerMask {
            enabled: true,
            bounds: Bounds::new(5.0, 5.0, 20.0, 20.0),
            default_color: 0,
            image: None,
        }),
        ..SourceLayer::default()
    };
    let doc = SourceDocument {
        name: "Poster".to_owned(),
        width: 400.0,
        height: 300.0,
        layers: vec![star],
        guides: Vec::new(),
        grid: None,
        slices: Vec::new(),
        resolution: None,
    };
    let out = SceneBuilder::default().build(&doc).unwrap();

    let wrapper = &out.document.nodes[0];
    assert_eq!(wrapper.name, "Star");
    let f = frame(wrapper);
    assert_eq!(f.role, FrameRole::LayerMask);
    let content = f.children.last().unwrap();
    assert_eq!(content.name, format!("Star{VECTOR_FAILED_SUFFIX}"));
    assert_eq!(content.name, "Star [Vector Failed]");
}

#[test]
fn group_with_clipping_children_becomes_frame_with_local_coordinates() {
    let out = build(json!([
        {"name": "Card", "type": "group", "bounds": {"x": 100, "y": 50, "width": 80, "height": 40},
         "children": [
            {"name": "Bg", "type": "image", "bounds": {"x": 100, "y": 50, "width": 80, "height": 40}},
            {"name": "Shine", "type": "image", "clipping": true,
             "bounds": {"x": 110, "y": 60, "width": 10, "height": 10}},
         ]},
        {"name": "Plain", "type": "group", "bounds": {"x": 0, "y": 0, "width": 10, "height": 10},
         "children": [
            {"name": "Dot", "type": "image", "bounds": {"x": 3, "y": 4, "width": 2, "height": 2}},
         ]},
    ]));
    let card = &out.document.nodes[0];
    let f = frame(card);
    assert_eq!(f.role, FrameRole::Group);
    assert!(f.clips_content);
    let clip = &f.children[0];
    assert_eq!((clip.x, clip.y), (0.0, 0.0));
    assert_eq!((frame(clip).children[2].x, frame(clip).children[2].y), (10.0, 10.0));

    let plain = &out.document.nodes[1];
    assert_eq!(plain.type_name(), "GROUP");
    assert_eq!((plain.children()[0].x, plain.children()[0].y), (3.0, 4.0));
}

#[test]
fn flattening_splices_group_children() {
    let source = doc(json!([
        {"name": "G", "type": "group", "children": [
            {"name": "One", "type": "image"},
            {"name": "Two", "type": "image"},
        ]},
        {"name": "Three", "type": "image"},
    ]));
    let builder = SceneBuilder::new(BuildOptions {
        preserve_groups: false,
        ..BuildOptions::default()
    });
    let out = builder.build(&source).unwrap();
    let names: Vec<_> = out.document.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["One", "Two", "Three"]);
    assert_eq!(out.summary.groups, 1);
    assert_eq!(out.summary.total_layers, 4);
}

#[test]
fn failing_layer_becomes_placeholder() {
    let out = build(json!([
        {"name": "Broken", "type": "image", "bounds": {"x": 1, "y": 2, "width": 3, "height": 4},
         "image": {"inline": ""}},
        {"name": "Fine", "type": "image"},
    ]));
    assert_eq!(out.document.nodes[0].name, "[Build Failed] Broken");
    assert_eq!(out.document.nodes[0].type_name(), "RECTANGLE");
    assert_eq!(out.document.nodes[1].name, "Fine");
    assert_eq!(out.summary.failed_layers, 1);
}

#[test]
fn summary_counts_layer_kinds() {
    let out = build(json!([
        {"name": "G", "type": "group", "children": [
            {"name": "T", "type": "text", "text": {"text": "Hi", "fontSize": 12, "fontFamily": "Inter"}},
            {"name": "S", "type": "vector"},
        ]},
        {"name": "P", "type": "image", "image": {"inline": "AQID"}},
        {"name": "Curves", "type": "adjustment", "adjustment": {"type": "curves"}},
    ]));
    let s = out.summary;
    assert_eq!(s.total_layers, 5);
    assert_eq!(s.groups, 1);
    assert_eq!(s.text_layers, 1);
    assert_eq!(s.shape_layers, 1);
    assert_eq!(s.image_layers, 1);
    assert_eq!(s.adjustment_layers, 1);
    assert_eq!(s.failed_layers, 0);
    assert_eq!(out.images.len(), 1);
}

#[test]
fn ids_are_stable_across_runs() {
    let layers = json!([
        {"name": "A", "type": "image"},
        {"name": "B", "type": "image"},
    ]);
    let a = build(layers.clone());
    let b = build(layers);
    let ids = |c: &Conversion| c.document.nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
    assert_ne!(a.document.nodes[0].id, a.document.nodes[1].id);
}

#[test]
fn build_tree_embeds_images_inline() {
    let source = doc(json!([
        {"name": "P", "type": "image", "image": {"inline": "AQID"}},
    ]));
    let nodes = build_tree(&source.layers);
    let NodeKind::Rectangle(data) = &nodes[0].kind else {
        panic!("expected rectangle");
    };
    assert_eq!(data.image.as_ref().and_then(|i| i.data.as_deref()), Some("AQID"));
}

#[test]
fn invalid_canvas_is_rejected() {
    let mut source = doc(json!([]));
    source.width = 0.0;
    assert!(matches!(
        SceneBuilder::default().build(&source),
        Err(SceneError::Validation(_))
    ));
}
