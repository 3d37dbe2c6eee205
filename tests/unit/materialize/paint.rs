use super::*;
use crate::scene::model::{
    Glow, GradientKind, GradientStop, LayerBlur, OneOrMany, Offset, Shadow, SolidFill,
    StrokeData, StrokeEffect, StyleRange, TextAlignH,
};
use crate::source::model::{LineCap, LineJoin, StrokeAlign};

fn red() -> Rgba {
    Rgba::new(1.0, 0.0, 0.0, 1.0)
}

fn gradient() -> Gradient {
    Gradient {
        kind: GradientKind::Linear,
        angle: 90.0,
        stops: vec![
            GradientStop {
                position: 0.0,
                color: Rgba::WHITE,
            },
            GradientStop {
                position: 1.0,
                color: red(),
            },
        ],
        opacity: 1.0,
        blend_mode: Default::default(),
    }
}

#[test]
fn overlays_outrank_declared_vector_fill() {
    let shape = ShapeData {
        vector_fill: Some(VectorFill::Solid {
            color: Rgba::gray(0.1),
        }),
        ..ShapeData::default()
    };
    assert_eq!(
        fallback_fill(&shape, None),
        Some(Paint::Solid {
            color: Rgba::gray(0.1)
        })
    );

    let mut fx = Effects {
        gradient_overlay: Some(gradient()),
        ..Effects::default()
    };
    assert!(matches!(
        fallback_fill(&shape, Some(&fx)),
        Some(Paint::GradientLinear { .. })
    ));

    fx.solid_fill = Some(SolidFill {
        color: red(),
        blend_mode: Default::default(),
    });
    assert_eq!(
        fallback_fill(&shape, Some(&fx)),
        Some(Paint::Solid { color: red() })
    );
    assert_eq!(fallback_fill(&ShapeData::default(), None), None);
}

#[test]
fn fragment_defaults_to_mid_gray() {
    let (hex, a) = fragment_fill(&ShapeData::default(), None);
    assert_eq!(hex, "#808080");
    assert_eq!(a, 1.0);
}

#[test]
fn vector_stroke_wins_over_effect_stroke() {
    let effect_stroke = StrokeEffect {
        color: Some(red()),
        size: 3.0,
        position: StrokeAlign::Outside,
        opacity: 0.5,
        fill_type: StrokeFillType::Solid,
        gradient: None,
    };
    let fx = Effects {
        stroke: Some(OneOrMany::One(effect_stroke)),
        ..Effects::default()
    };

    let from_effect = stroke_spec(&ShapeData::default(), Some(&fx)).unwrap();
    assert_eq!(from_effect.weight, 3.0);
    assert_eq!(from_effect.color.a, 0.5);
    assert_eq!(from_effect.align, StrokeAlign::Outside);

    let shape = ShapeData {
        vector_stroke: Some(StrokeData {
            color: Rgba::gray(0.0),
            weight: 2.0,
            align: StrokeAlign::Inside,
            cap: LineCap::default(),
            join: LineJoin::default(),
            dash_pattern: vec![4.0, 2.0],
        }),
        ..ShapeData::default()
    };
    let declared = stroke_spec(&shape, Some(&fx)).unwrap();
    assert_eq!(declared.weight, 2.0);
    assert_eq!(declared.dash_pattern, vec![4.0, 2.0]);
}

#[test]
fn glows_become_zero_offset_shadows() {
    let shadow = Shadow {
        color: Rgba::gray(0.0),
        offset: Offset { x: 3.0, y: 4.0 },
        blur: 5.0,
        spread: 0.0,
    };
    let glow = Glow {
        color: red(),
        blur: 8.0,
        spread: 1.0,
    };
    let fx = Effects {
        drop_shadow: Some(OneOrMany::Many(vec![shadow, shadow])),
        outer_glow: Some(glow),
        inner_glow: Some(glow),
        layer_blur: Some(LayerBlur { radius: 2.0 }),
        ..Effects::default()
    };
    let out = native_effects(&fx);
    assert_eq!(out.len(), 5);
    assert!(matches!(out[2], NativeEffect::LayerBlur { radius } if radius == 2.0));
    assert_eq!(
        out[3],
        NativeEffect::DropShadow {
            color: red(),
            offset: Vec2::ZERO,
            radius: 8.0,
            spread: 1.0
        }
    );
    assert!(matches!(out[4], NativeEffect::InnerShadow { offset, .. } if offset == Vec2::ZERO));
}

fn text(characters: &str) -> TextData {
    TextData {
        characters: characters.to_owned(),
        font_family: "Inter".to_owned(),
        font_style: None,
        font_size: 13.456,
        color: Rgba::gray(0.0),
        line_height: Some(18.0),
        letter_spacing: Some(-0.04),
        text_align: TextAlignH::Center,
        underline: false,
        strikethrough: false,
        style_ranges: vec![
            StyleRange {
                start: 0,
                end: 2,
                color: Some(red()),
                ..StyleRange::default()
            },
            StyleRange {
                start: 2,
                end: 4,
                ..StyleRange::default()
            },
        ],
        sizing: TextSizing::Wrap,
        rotation: None,
    }
}

#[test]
fn text_content_rounds_and_scales() {
    let c = text_content(&text("Hi\nThere"), FontName::new("Inter", "Regular"));
    assert_eq!(c.font_size, 13.46);
    assert!((c.letter_spacing.unwrap() + 4.0).abs() < 1e-9);
    assert_eq!(c.line_height, Some(18.0));
    assert_eq!(c.resize, TextResize::Height);
    assert_eq!(c.ranges.len(), 1);
}

#[test]
fn single_line_text_drops_line_height() {
    let c = text_content(&text("Title"), FontName::new("Inter", "Regular"));
    assert_eq!(c.line_height, None);
}
