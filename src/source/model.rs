use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Bounds, Vec2};
use crate::normalize::color::RawColor;
use crate::normalize::effects::SourceEffects;

/// Parsed layered-image document, as produced by the PSD parser.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub layers: Vec<SourceLayer>,
    #[serde(default)]
    pub guides: Vec<SourceGuide>,
    #[serde(default)]
    pub grid: Option<SourceGrid>,
    #[serde(default)]
    pub slices: Vec<SourceSlice>,
    #[serde(default)]
    pub resolution: Option<SourceResolution>,
}

/// Layer kind reported by the parser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Group,
    #[default]
    #[serde(alias = "layer")]
    Image,
    Text,
    #[serde(alias = "shape")]
    Vector,
    Adjustment,
}

/// One record of the source layer tree.
///
/// Records keep source painting order: within a sibling list, later entries paint over
/// earlier ones.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceLayer {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: LayerKind,
    pub bounds: Bounds,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default = "normal_blend")]
    pub blend_mode: String,
    #[serde(default = "yes")]
    pub visible: bool,
    /// Layer color label (`red`, `blue`...); `none` is dropped.
    pub color: Option<String>,
    pub locked: bool,
    pub children: Vec<SourceLayer>,
    /// Clips to the nearest preceding non-clipping sibling.
    pub clipping: bool,
    pub mask: Option<SourceLayerMask>,
    pub vector_mask: Option<SourceVectorMask>,
    pub vector_fill: Option<SourceVectorFill>,
    pub vector_stroke: Option<SourceVectorStroke>,
    #[serde(alias = "textData")]
    pub text: Option<SourceText>,
    pub effects: Option<SourceEffects>,
    #[serde(alias = "imageData")]
    pub image: Option<RasterRef>,
    pub adjustment: Option<SourceAdjustment>,
    pub smart_filters: Vec<SourceSmartFilter>,
    #[serde(alias = "placedLayer")]
    pub placed: Option<SourcePlaced>,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn normal_blend() -> String {
    "normal".to_owned()
}

/// Closed view of a layer used by the builder dispatch.
#[derive(Clone, Copy, Debug)]
pub enum LayerRole<'a> {
    Group(&'a [SourceLayer]),
    Text(&'a SourceText),
    Shape,
    Adjustment(Option<&'a SourceAdjustment>),
}

impl SourceLayer {
    /// Kind and payload folded together. A text layer without a text payload is drawn
    /// as a shape.
    pub fn role(&self) -> LayerRole<'_> {
        match self.kind {
            LayerKind::Group => LayerRole::Group(&self.children),
            LayerKind::Text => match &self.text {
                Some(t) => LayerRole::Text(t),
                None => LayerRole::Shape,
            },
            LayerKind::Adjustment => LayerRole::Adjustment(self.adjustment.as_ref()),
            LayerKind::Image | LayerKind::Vector => LayerRole::Shape,
        }
    }

    pub fn has_clipping_children(&self) -> bool {
        self.children.iter().any(|c| c.clipping)
    }

    /// Vector mask paths, if present and enabled.
    pub fn active_vector_paths(&self) -> Option<&[SourceSubpath]> {
        self.vector_mask
            .as_ref()
            .filter(|m| m.enabled && !m.paths.is_empty())
            .map(|m| m.paths.as_slice())
    }
}

/// Raster payload: bytes carried inline, or a file already streamed to disk by the parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RasterRef {
    Inline(#[serde(with = "base64_bytes")] Vec<u8>),
    Streamed(String),
}

pub(crate) mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(s.trim()).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLayerMask {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub bounds: Bounds,
    /// Mask value outside `bounds`: 255 shows the layer there, 0 hides it.
    #[serde(default = "mask_default_color")]
    pub default_color: u8,
    #[serde(default, alias = "imageData")]
    pub image: Option<RasterRef>,
}

fn mask_default_color() -> u8 {
    255
}

impl SourceLayerMask {
    /// Only a mask that hides the outside of its bounds changes what is visible.
    pub fn hides_outside(&self) -> bool {
        self.enabled && self.default_color == 0
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceVectorMask {
    #[serde(default = "yes")]
    pub enabled: bool,
    pub paths: Vec<SourceSubpath>,
}

/// Primitive shape recorded with a sub-path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubpathShape {
    Rect,
    Ellipse,
    Polygon,
    #[default]
    Path,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSubpath {
    #[serde(alias = "type")]
    pub shape: SubpathShape,
    /// Missing means closed.
    pub closed: Option<bool>,
    #[serde(alias = "knots")]
    pub points: Vec<Knot>,
    /// Used by rect/ellipse primitives that carry no knots.
    pub bounds: Option<Bounds>,
    pub corner_radius: Option<f64>,
}

/// Bezier knot in absolute document space; missing handles sit on the anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Knot {
    pub x: f64,
    pub y: f64,
    pub before_x: Option<f64>,
    pub before_y: Option<f64>,
    pub after_x: Option<f64>,
    pub after_y: Option<f64>,
}

impl Knot {
    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn before(&self) -> Vec2 {
        Vec2::new(self.before_x.unwrap_or(self.x), self.before_y.unwrap_or(self.y))
    }

    pub fn after(&self) -> Vec2 {
        Vec2::new(self.after_x.unwrap_or(self.x), self.after_y.unwrap_or(self.y))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeAlign {
    Inside,
    #[default]
    Center,
    Outside,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceVectorStroke {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub color: RawColor,
    #[serde(default = "one")]
    pub width: f64,
    #[serde(default)]
    pub line_alignment: StrokeAlign,
    #[serde(default)]
    pub line_cap: LineCap,
    #[serde(default)]
    pub line_join: LineJoin,
    #[serde(default)]
    pub dash_pattern: Vec<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceVectorFill {
    Solid {
        color: RawColor,
    },
    Gradient {
        gradient: crate::normalize::effects::SourceGradient,
    },
    /// Pattern fills carry no pixels; they are drawn as the placeholder.
    Pattern,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceText {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_style: Option<String>,
    pub color: RawColor,
    /// Pixels.
    pub line_height: Option<f64>,
    /// Em units (tracking / 1000).
    pub letter_spacing: Option<f64>,
    #[serde(alias = "textAlign")]
    pub align: TextAlign,
    pub underline: bool,
    pub strikethrough: bool,
    #[serde(alias = "styleRuns")]
    pub runs: Vec<SourceStyleRun>,
    pub transform: Option<SourceTextTransform>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceStyleRun {
    pub text: String,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_style: Option<String>,
    pub color: Option<RawColor>,
    pub letter_spacing: Option<f64>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
}

/// Text affine `[xx, xy, yx, yy, tx, ty]` with optional precomputed rotation/scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTextTransform {
    pub xx: f64,
    pub xy: f64,
    pub yx: f64,
    pub yy: f64,
    #[serde(default)]
    pub tx: f64,
    #[serde(default)]
    pub ty: f64,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
}

impl SourceTextTransform {
    /// Rotation in degrees (clockwise-positive, source convention).
    pub fn rotation_degrees(&self) -> f64 {
        match self.rotation {
            Some(r) if r.is_finite() => r,
            _ => {
                let r = self.xy.atan2(self.xx).to_degrees();
                if r.is_finite() { r } else { 0.0 }
            }
        }
    }

    pub fn scale(&self) -> (f64, f64) {
        let sx = self.scale_x.unwrap_or_else(|| self.xx.hypot(self.xy));
        let sy = self.scale_y.unwrap_or_else(|| self.yx.hypot(self.yy));
        (sx, sy)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAdjustment {
    /// `brightness-contrast`, `levels`, `curves`...
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default, flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSmartFilter {
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub blend_mode: Option<String>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacedKind {
    #[default]
    Embedded,
    Linked,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcePlaced {
    #[serde(alias = "type")]
    pub kind: PlacedKind,
    pub transform: Option<SourceTextTransform>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideDirection {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceGuide {
    pub location: f64,
    pub direction: GuideDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceGrid {
    pub horizontal: f64,
    pub vertical: f64,
    #[serde(default)]
    pub subdivisions: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSlice {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionUnit {
    #[serde(rename = "PPI")]
    Ppi,
    #[serde(rename = "PPCM")]
    Ppcm,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResolution {
    pub horizontal: f64,
    pub horizontal_unit: ResolutionUnit,
    pub vertical: f64,
    pub vertical_unit: ResolutionUnit,
}

#[cfg(test)]
#[path = "../../tests/unit/source/model.rs"]
mod tests;
