use super::*;
use serde_json::json;

fn leaf(name: &str, kind: NodeKind) -> TargetNode {
    TargetNode {
        id: format!("id-{name}"),
        name: name.to_owned(),
        x: 1.5,
        y: -2.25,
        width: 10.0,
        height: 20.0,
        opacity: 0.8,
        blend_mode: BlendMode::Multiply,
        visible: true,
        color: None,
        locked: false,
        kind,
        effects: None,
    }
}

#[test]
fn blend_modes_map_kebab_case_and_fall_back() {
    assert_eq!(BlendMode::from_source("color-burn"), BlendMode::ColorBurn);
    assert_eq!(BlendMode::from_source("SOFT-LIGHT"), BlendMode::SoftLight);
    assert_eq!(BlendMode::from_source("pass through"), BlendMode::Normal);
    assert_eq!(BlendMode::from_source("vivid-light"), BlendMode::Normal);
    assert_eq!(
        serde_json::to_value(BlendMode::ColorDodge).unwrap(),
        json!("COLOR_DODGE")
    );
}

#[test]
fn single_shadow_serializes_as_object_and_many_as_array() {
    let s = Shadow {
        color: Rgba::new(0.0, 0.0, 0.0, 0.5),
        offset: Offset { x: 1.0, y: 2.0 },
        blur: 4.0,
        spread: 0.0,
    };
    let one = Effects {
        drop_shadow: OneOrMany::from_vec(vec![s]),
        ..Effects::default()
    };
    assert!(serde_json::to_value(&one).unwrap()["dropShadow"].is_object());

    let many = Effects {
        drop_shadow: OneOrMany::from_vec(vec![s, s]),
        ..Effects::default()
    };
    assert_eq!(
        serde_json::to_value(&many).unwrap()["dropShadow"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );
    assert!(OneOrMany::<Shadow>::from_vec(vec![]).is_none());
}

#[test]
fn node_kind_is_tagged_by_type_next_to_common_fields() {
    let node = leaf(
        "frame",
        NodeKind::Frame(FrameData {
            role: FrameRole::ClippingGroup,
            clips_content: true,
            children: vec![],
        }),
    );
    let v = serde_json::to_value(&node).unwrap();
    assert_eq!(v["type"], json!("FRAME"));
    assert_eq!(v["role"], json!("CLIPPING_GROUP"));
    assert_eq!(v["clipsContent"], json!(true));
    assert_eq!(v["blendMode"], json!("MULTIPLY"));
    assert!(v.get("locked").is_none());
}

#[test]
fn document_roundtrips_structurally() {
    let text = TextData {
        characters: "Hi\nThere".to_owned(),
        font_family: "Inter".to_owned(),
        font_style: Some("Bold".to_owned()),
        font_size: 20.0,
        color: Rgba::new(0.1, 0.2, 0.3, 1.0),
        line_height: Some(24.0),
        letter_spacing: Some(0.05),
        text_align: TextAlignH::Justified,
        underline: true,
        strikethrough: false,
        style_ranges: vec![StyleRange {
            start: 0,
            end: 2,
            font_size: Some(18.0),
            ..StyleRange::default()
        }],
        sizing: TextSizing::Wrap,
        rotation: Some(12.5),
    };
    let mask = leaf(
        "mask",
        NodeKind::Mask(MaskData {
            source: MaskSource::Path {
                path_data: "M 0.00 0.00 L 10.00 0.00 L 10.00 10.00 Z".to_owned(),
                fill_rule: FillRule::Evenodd,
            },
        }),
    );
    let shape = TargetNode {
        effects: Some(Effects {
            stroke: Some(OneOrMany::One(StrokeEffect {
                color: Some(Rgba::new(1.0, 0.0, 0.0, 1.0)),
                size: 3.0,
                position: StrokeAlign::Outside,
                opacity: 0.5,
                fill_type: StrokeFillType::Solid,
                gradient: None,
            })),
            layer_blur: Some(LayerBlur { radius: 2.0 }),
            ..Effects::default()
        }),
        ..leaf(
            "shape",
            NodeKind::Vector(ShapeData {
                vector_path: Some(VectorPathData {
                    path_data: "M 0.00 0.00 L 4.00 4.00 Z".to_owned(),
                    fill_rule: FillRule::Nonzero,
                }),
                vector_fill: Some(VectorFill::Gradient {
                    gradient: Gradient {
                        kind: GradientKind::Linear,
                        angle: 90.0,
                        stops: vec![
                            GradientStop {
                                position: 0.0,
                                color: Rgba::WHITE,
                            },
                            GradientStop {
                                position: 1.0,
                                color: Rgba::gray(0.0),
                            },
                        ],
                        opacity: 1.0,
                        blend_mode: BlendMode::Normal,
                    },
                }),
                image: Some(ImageRef {
                    file_name: "shape_1.png".to_owned(),
                    data: None,
                }),
                ..ShapeData::default()
            }),
        )
    };
    let adjustment = leaf(
        "levels",
        NodeKind::Adjustment(AdjustmentData {
            kind: "levels".to_owned(),
            params: [("gamma".to_owned(), json!(1.2))].into_iter().collect(),
        }),
    );
    let doc = SceneDocument {
        version: FORMAT_VERSION.to_owned(),
        name: "poster".to_owned(),
        canvas: Canvas {
            width: 800.0,
            height: 600.0,
        },
        nodes: vec![
            leaf(
                "clip",
                NodeKind::Frame(FrameData {
                    role: FrameRole::ClippingGroup,
                    clips_content: true,
                    children: vec![mask, shape],
                }),
            ),
            leaf("title", NodeKind::Text(text)),
            leaf("group", NodeKind::Group(GroupData { children: vec![adjustment] })),
        ],
        guides: Some(vec![Guide {
            position: 120.0,
            direction: GuideDirection::Vertical,
        }]),
        grid: None,
        slices: Some(vec![Slice {
            id: 1,
            name: "hero".to_owned(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
            url: None,
        }]),
        resolution: Some(Resolution {
            horizontal: 72.0,
            horizontal_unit: ResolutionUnit::Ppi,
            vertical: 72.0,
            vertical_unit: ResolutionUnit::Ppi,
        }),
    };

    let text = serde_json::to_string_pretty(&doc).unwrap();
    let back: SceneDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(back, doc);
    assert_eq!(doc.node_count(), 6);
}
