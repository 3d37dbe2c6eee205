use serde::{Deserialize, Serialize};

use crate::foundation::core::{Rgba, Vec2, finite_or};
use crate::normalize::color::{RawColor, normalize_color, normalize_opacity};
use crate::scene::model::{
    BevelEmboss, BlendMode, Effects, Glow, Gradient, GradientKind, GradientStop, LayerBlur,
    Offset, OneOrMany, PatternOverlay, Satin, Shadow, SolidFill, StrokeEffect, StrokeFillType,
};
use crate::source::model::{RasterRef, StrokeAlign};

/// Photoshop's default global light angle.
pub const DEFAULT_SHADOW_ANGLE: f64 = 120.0;
pub const DEFAULT_SHADOW_OPACITY: f64 = 0.75;

fn yes() -> bool {
    true
}

fn one() -> f64 {
    1.0
}

fn hundred() -> f64 {
    100.0
}

/// Effect stack as reported by the parser. Every entry can be switched off on its own.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceEffects {
    pub drop_shadow: Option<OneOrMany<SourceShadow>>,
    pub inner_shadow: Option<OneOrMany<SourceShadow>>,
    pub outer_glow: Option<SourceGlow>,
    pub inner_glow: Option<SourceGlow>,
    pub stroke: Option<OneOrMany<SourceStroke>>,
    pub bevel_emboss: Option<SourceBevelEmboss>,
    pub gaussian_blur: Option<SourceBlur>,
    pub solid_fill: Option<SourceSolidFill>,
    pub gradient_overlay: Option<SourceGradient>,
    pub satin: Option<SourceSatin>,
    pub pattern_overlay: Option<SourcePatternOverlay>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceShadow {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub color: RawColor,
    pub opacity: Option<f64>,
    pub angle: Option<f64>,
    pub distance: Option<f64>,
    pub blur: f64,
    pub spread: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceGlow {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub color: RawColor,
    #[serde(default = "one")]
    pub opacity: f64,
    pub blur: f64,
    pub spread: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceStroke {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub color: Option<RawColor>,
    #[serde(alias = "width")]
    pub size: f64,
    pub position: StrokeAlign,
    #[serde(default = "one")]
    pub opacity: f64,
    pub fill_type: StrokeFillType,
    pub gradient: Option<SourceGradient>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceBevelEmboss {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub style: String,
    pub technique: String,
    pub depth: f64,
    pub direction: String,
    pub size: f64,
    pub soften: f64,
    pub angle: f64,
    pub altitude: f64,
    pub highlight_color: RawColor,
    #[serde(default = "one")]
    pub highlight_opacity: f64,
    pub shadow_color: RawColor,
    #[serde(default = "one")]
    pub shadow_opacity: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceBlur {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub radius: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSolidFill {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub color: RawColor,
    #[serde(default = "one")]
    pub opacity: f64,
    pub blend_mode: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceGradientStop {
    /// `0..=100`.
    pub location: f64,
    pub color: RawColor,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceGradient {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "one")]
    pub opacity: f64,
    pub blend_mode: String,
    pub angle: f64,
    #[serde(alias = "type")]
    pub kind: GradientKind,
    #[serde(alias = "colors")]
    pub stops: Vec<SourceGradientStop>,
    pub reverse: bool,
    /// Percent; 100 leaves stop positions alone.
    #[serde(default = "hundred")]
    pub scale: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSatin {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub color: RawColor,
    #[serde(default = "one")]
    pub opacity: f64,
    pub angle: f64,
    pub distance: f64,
    pub size: f64,
    pub blend_mode: Option<String>,
    pub invert: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcePatternOverlay {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "one")]
    pub opacity: f64,
    pub blend_mode: String,
    #[serde(default = "hundred")]
    pub scale: f64,
    pub pattern_name: Option<String>,
    #[serde(alias = "patternData")]
    pub pattern: Option<RasterRef>,
}

/// Shadow offset from a light angle (degrees) and distance: `(cos θ·d, sin θ·d)`.
///
/// Non-finite input or output collapses to a zero offset.
pub fn shadow_offset_from_angle_distance(angle_deg: f64, distance: f64) -> Vec2 {
    if !(angle_deg.is_finite() && distance.is_finite()) {
        return Vec2::ZERO;
    }
    let rad = angle_deg.to_radians();
    let v = Vec2::new(rad.cos() * distance, rad.sin() * distance);
    if v.is_finite() { v } else { Vec2::ZERO }
}

/// 2x3 affine mapping normalized gradient space onto the node: a rotation by `angle_deg`
/// about `(0.5, 0.5)`.
pub fn linear_gradient_transform(angle_deg: f64) -> [[f64; 3]; 2] {
    let rad = finite_or(angle_deg, 0.0).to_radians();
    let (s, c) = rad.sin_cos();
    [
        [c, s, 0.5 - c * 0.5 - s * 0.5],
        [-s, c, 0.5 + s * 0.5 - c * 0.5],
    ]
}

/// Convert 0..100 stop locations into sorted 0..1 positions.
///
/// `reverse` mirrors positions; `scale` (percent) stretches them about the center.
pub fn gradient_stops(
    stops: &[SourceGradientStop],
    reverse: bool,
    scale: f64,
) -> Vec<GradientStop> {
    let k = if scale.is_finite() && scale > 0.0 {
        scale / 100.0
    } else {
        1.0
    };
    let mut out: Vec<GradientStop> = stops
        .iter()
        .map(|s| {
            let mut p = finite_or(s.location, 0.0) / 100.0;
            if reverse {
                p = 1.0 - p;
            }
            p = 0.5 + (p - 0.5) * k;
            GradientStop {
                position: p.clamp(0.0, 1.0),
                color: normalize_color(s.color),
            }
        })
        .collect();
    out.sort_by(|a, b| a.position.total_cmp(&b.position));
    out
}

pub fn normalize_gradient(g: &SourceGradient) -> Gradient {
    Gradient {
        kind: g.kind,
        angle: finite_or(g.angle, 0.0),
        stops: gradient_stops(&g.stops, g.reverse, g.scale),
        opacity: normalize_opacity(g.opacity),
        blend_mode: BlendMode::from_source(&g.blend_mode),
    }
}

fn with_alpha(c: RawColor, opacity: f64) -> Rgba {
    Rgba {
        a: normalize_opacity(opacity),
        ..normalize_color(c)
    }
}

fn normalize_shadow(s: &SourceShadow) -> Shadow {
    let angle = s
        .angle
        .filter(|a| a.is_finite())
        .unwrap_or(DEFAULT_SHADOW_ANGLE);
    let distance = s.distance.filter(|d| d.is_finite()).unwrap_or(0.0);
    let offset = shadow_offset_from_angle_distance(angle, distance);
    Shadow {
        color: with_alpha(s.color, s.opacity.unwrap_or(DEFAULT_SHADOW_OPACITY)),
        offset: Offset {
            x: offset.x,
            y: offset.y,
        },
        blur: finite_or(s.blur, 0.0).max(0.0),
        spread: finite_or(s.spread, 0.0),
    }
}

fn normalize_glow(g: &SourceGlow) -> Glow {
    Glow {
        color: with_alpha(g.color, g.opacity),
        blur: finite_or(g.blur, 0.0).max(0.0),
        spread: finite_or(g.spread, 0.0),
    }
}

fn normalize_stroke(s: &SourceStroke) -> StrokeEffect {
    let gradient = match (s.fill_type, &s.gradient) {
        (StrokeFillType::Gradient, Some(g)) => Some(normalize_gradient(g)),
        _ => None,
    };
    StrokeEffect {
        color: match gradient {
            Some(_) => None,
            None => s.color.map(|c| with_alpha(c, s.opacity)),
        },
        size: finite_or(s.size, 0.0).max(0.0),
        position: s.position,
        opacity: normalize_opacity(s.opacity),
        fill_type: s.fill_type,
        gradient,
    }
}

/// Names the side-channel file for a pattern payload; `None` keeps the pattern metadata only.
pub type PatternExport<'a> = &'a mut dyn FnMut(&RasterRef) -> Option<crate::scene::model::ImageRef>;

/// Normalize a parser effect stack into the flat intermediate form.
///
/// Disabled entries are dropped. Shadows and strokes keep the single/multiple distinction.
pub fn normalize_effects(src: &SourceEffects, export_pattern: PatternExport<'_>) -> Effects {
    let shadows = |list: &Option<OneOrMany<SourceShadow>>| {
        list.as_ref().and_then(|l| {
            OneOrMany::from_vec(l.iter().filter(|s| s.enabled).map(normalize_shadow).collect())
        })
    };

    Effects {
        drop_shadow: shadows(&src.drop_shadow),
        inner_shadow: shadows(&src.inner_shadow),
        outer_glow: src.outer_glow.as_ref().filter(|g| g.enabled).map(normalize_glow),
        inner_glow: src.inner_glow.as_ref().filter(|g| g.enabled).map(normalize_glow),
        stroke: src.stroke.as_ref().and_then(|l| {
            OneOrMany::from_vec(l.iter().filter(|s| s.enabled).map(normalize_stroke).collect())
        }),
        layer_blur: src
            .gaussian_blur
            .as_ref()
            .filter(|b| b.enabled && b.radius.is_finite() && b.radius > 0.0)
            .map(|b| LayerBlur { radius: b.radius }),
        solid_fill: src
            .solid_fill
            .as_ref()
            .filter(|f| f.enabled)
            .map(|f| SolidFill {
                color: with_alpha(f.color, f.opacity),
                blend_mode: BlendMode::from_source(&f.blend_mode),
            }),
        gradient_overlay: src
            .gradient_overlay
            .as_ref()
            .filter(|g| g.enabled && !g.stops.is_empty())
            .map(normalize_gradient),
        satin: src.satin.as_ref().filter(|s| s.enabled).map(|s| Satin {
            color: with_alpha(s.color, s.opacity),
            angle: finite_or(s.angle, 0.0),
            distance: finite_or(s.distance, 0.0),
            size: finite_or(s.size, 0.0),
            blend_mode: s
                .blend_mode
                .as_deref()
                .map_or(BlendMode::Multiply, BlendMode::from_source),
            invert: s.invert,
        }),
        bevel_emboss: src
            .bevel_emboss
            .as_ref()
            .filter(|b| b.enabled)
            .map(|b| BevelEmboss {
                style: b.style.clone(),
                technique: b.technique.clone(),
                depth: b.depth,
                direction: b.direction.clone(),
                size: b.size,
                soften: b.soften,
                angle: b.angle,
                altitude: b.altitude,
                highlight_color: with_alpha(b.highlight_color, b.highlight_opacity),
                shadow_color: with_alpha(b.shadow_color, b.shadow_opacity),
            }),
        pattern_overlay: src
            .pattern_overlay
            .as_ref()
            .filter(|p| p.enabled)
            .map(|p| PatternOverlay {
                opacity: normalize_opacity(p.opacity),
                blend_mode: BlendMode::from_source(&p.blend_mode),
                scale: finite_or(p.scale, 100.0),
                pattern_name: p.pattern_name.clone(),
                image: p.pattern.as_ref().and_then(|r| export_pattern(r)),
            }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/effects.rs"]
mod tests;
