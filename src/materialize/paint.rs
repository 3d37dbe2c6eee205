use crate::assets::decode::FragmentStroke;
use crate::foundation::core::{Rgba, Vec2, round2};
use crate::materialize::fonts::FontName;
use crate::materialize::host::{
    NativeEffect, Paint, RangeStyle, StrokeSpec, TextContent, TextResize,
};
use crate::normalize::effects::linear_gradient_transform;
use crate::scene::model::{
    Effects, Gradient, ShapeData, StrokeFillType, TextData, TextSizing, VectorFill,
};

/// Fill of a shape with nothing better to show.
pub const PLACEHOLDER_GRAY: f64 = 0.8;
/// Fill of a shape whose referenced image could not be found or decoded.
pub const MISSING_IMAGE_GRAY: f64 = 0.9;
/// Fill written into vector fragments when the shape declares no solid color.
pub const FRAGMENT_GRAY: f64 = 0.5;
pub const MISSING_IMAGE_PREFIX: &str = "[IMG] ";

pub fn gradient_paint(g: &Gradient) -> Paint {
    Paint::GradientLinear {
        stops: g.stops.clone(),
        transform: linear_gradient_transform(g.angle),
        opacity: g.opacity,
    }
}

/// Best non-image fill: solid overlay, then gradient overlay, then the declared vector fill.
pub fn fallback_fill(shape: &ShapeData, effects: Option<&Effects>) -> Option<Paint> {
    if let Some(fill) = effects.and_then(|fx| fx.solid_fill.as_ref()) {
        return Some(Paint::Solid { color: fill.color });
    }
    if let Some(g) = effects.and_then(|fx| fx.gradient_overlay.as_ref()) {
        return Some(gradient_paint(g));
    }
    match shape.vector_fill.as_ref()? {
        VectorFill::Solid { color } => Some(Paint::Solid { color: *color }),
        VectorFill::Gradient { gradient } => Some(gradient_paint(gradient)),
    }
}

/// Solid color and opacity written into a vector fragment.
pub fn fragment_fill(shape: &ShapeData, effects: Option<&Effects>) -> (String, f64) {
    let color = match fallback_fill(shape, effects) {
        Some(Paint::Solid { color }) => color,
        _ => Rgba::gray(FRAGMENT_GRAY),
    };
    (color.to_hex(), color.a)
}

pub fn fragment_stroke(shape: &ShapeData) -> Option<FragmentStroke> {
    shape.vector_stroke.as_ref().map(|s| FragmentStroke {
        hex: s.color.to_hex(),
        opacity: s.color.a,
        width: s.weight,
    })
}

/// The declared vector stroke wins; otherwise the first solid stroke effect.
pub fn stroke_spec(shape: &ShapeData, effects: Option<&Effects>) -> Option<StrokeSpec> {
    if let Some(s) = &shape.vector_stroke {
        return Some(StrokeSpec {
            color: s.color,
            weight: s.weight,
            align: s.align,
            dash_pattern: s.dash_pattern.clone(),
        });
    }
    let first = effects?.stroke.as_ref()?.first()?;
    if first.fill_type != StrokeFillType::Solid {
        return None;
    }
    let color = first.color?;
    Some(StrokeSpec {
        color: Rgba {
            a: (color.a * first.opacity).clamp(0.0, 1.0),
            ..color
        },
        weight: first.size,
        align: first.position,
        dash_pattern: Vec::new(),
    })
}

/// Effects the host can draw natively. Glows have no host primitive and become
/// zero-offset shadows.
pub fn native_effects(fx: &Effects) -> Vec<NativeEffect> {
    let mut out = Vec::new();
    for s in fx.drop_shadow.iter().flat_map(|v| v.iter()) {
        out.push(NativeEffect::DropShadow {
            color: s.color,
            offset: Vec2::new(s.offset.x, s.offset.y),
            radius: s.blur,
            spread: s.spread,
        });
    }
    for s in fx.inner_shadow.iter().flat_map(|v| v.iter()) {
        out.push(NativeEffect::InnerShadow {
            color: s.color,
            offset: Vec2::new(s.offset.x, s.offset.y),
            radius: s.blur,
            spread: s.spread,
        });
    }
    if let Some(b) = &fx.layer_blur {
        out.push(NativeEffect::LayerBlur { radius: b.radius });
    }
    if let Some(g) = &fx.outer_glow {
        out.push(NativeEffect::DropShadow {
            color: g.color,
            offset: Vec2::ZERO,
            radius: g.blur,
            spread: g.spread,
        });
    }
    if let Some(g) = &fx.inner_glow {
        out.push(NativeEffect::InnerShadow {
            color: g.color,
            offset: Vec2::ZERO,
            radius: g.blur,
            spread: g.spread,
        });
    }
    out
}

pub fn text_resize(sizing: TextSizing) -> TextResize {
    match sizing {
        TextSizing::Auto => TextResize::WidthAndHeight,
        TextSizing::Wrap => TextResize::Height,
        TextSizing::Fixed => TextResize::None,
    }
}

/// Host text content for a node, with sizes rounded to 2 decimals, letter spacing in
/// percent and line height kept only for multi-line text.
pub fn text_content(t: &TextData, font: FontName) -> TextContent {
    let multi_line = t.characters.contains('\n');
    TextContent {
        characters: t.characters.clone(),
        font,
        font_size: round2(t.font_size),
        color: t.color,
        letter_spacing: t.letter_spacing.map(|em| em * 100.0),
        line_height: t.line_height.filter(|_| multi_line),
        align: t.text_align,
        underline: t.underline,
        strikethrough: t.strikethrough,
        resize: text_resize(t.sizing),
        ranges: t
            .style_ranges
            .iter()
            .filter(|r| r.color.is_some() || r.font_size.is_some())
            .map(|r| RangeStyle {
                start: r.start,
                end: r.end,
                font_size: r.font_size.map(round2),
                color: r.color,
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/paint.rs"]
mod tests;
