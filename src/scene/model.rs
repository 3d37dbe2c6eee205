use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba;
use crate::source::model::{GuideDirection, ResolutionUnit, StrokeAlign};

/// Version tag written into every intermediate document.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Intermediate scene document: the contract between builder and materializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    pub version: String,
    pub name: String,
    pub canvas: Canvas,
    #[serde(default)]
    pub nodes: Vec<TargetNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guides: Option<Vec<Guide>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slices: Option<Vec<Slice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl SceneDocument {
    /// Nodes reachable from the roots, containers included.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[TargetNode]) -> usize {
            nodes.iter().map(|n| 1 + count(n.children())).sum()
        }
        count(&self.nodes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub position: f64,
    pub direction: GuideDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub horizontal: f64,
    pub vertical: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivisions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub horizontal: f64,
    pub horizontal_unit: ResolutionUnit,
    pub vertical: f64,
    pub vertical_unit: ResolutionUnit,
}

/// Host blend modes. Anything the host cannot express maps to [`BlendMode::Normal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    #[default]
    Normal,
    Darken,
    Multiply,
    ColorBurn,
    Lighten,
    Screen,
    ColorDodge,
    Overlay,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Map a parser blend identifier (`color-burn`, `multiply`...).
    pub fn from_source(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "darken" => Self::Darken,
            "multiply" => Self::Multiply,
            "color-burn" | "color burn" => Self::ColorBurn,
            "lighten" => Self::Lighten,
            "screen" => Self::Screen,
            "color-dodge" | "color dodge" => Self::ColorDodge,
            "overlay" => Self::Overlay,
            "soft-light" | "soft light" => Self::SoftLight,
            "hard-light" | "hard light" => Self::HardLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            "hue" => Self::Hue,
            "saturation" => Self::Saturation,
            "color" => Self::Color,
            "luminosity" => Self::Luminosity,
            "normal" | "pass through" | "pass-through" | "" => Self::Normal,
            other => {
                tracing::debug!(blend = other, "unsupported blend mode, using normal");
                Self::Normal
            }
        }
    }

    /// CSS `mix-blend-mode` keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Darken => "darken",
            Self::Multiply => "multiply",
            Self::ColorBurn => "color-burn",
            Self::Lighten => "lighten",
            Self::Screen => "screen",
            Self::ColorDodge => "color-dodge",
            Self::Overlay => "overlay",
            Self::SoftLight => "soft-light",
            Self::HardLight => "hard-light",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Color => "color",
            Self::Luminosity => "luminosity",
        }
    }
}

/// A single value or a list; single entries serialize as a bare object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// `None` for an empty list, `One` for a single entry.
    pub fn from_vec(mut items: Vec<T>) -> Option<Self> {
        match items.len() {
            0 => None,
            1 => items.pop().map(Self::One),
            _ => Some(Self::Many(items)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::One(v) => std::slice::from_ref(v).iter(),
            Self::Many(v) => v.iter(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }
}

/// One node of the intermediate tree.
///
/// `x`/`y` are relative to the nearest enclosing [`NodeKind::Frame`] (or the canvas);
/// groups do not open a coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetNode {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl TargetNode {
    pub fn children(&self) -> &[TargetNode] {
        match &self.kind {
            NodeKind::Group(g) => &g.children,
            NodeKind::Frame(f) => &f.children,
            _ => &[],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Group(_) => "GROUP",
            NodeKind::Frame(_) => "FRAME",
            NodeKind::Rectangle(_) => "RECTANGLE",
            NodeKind::Vector(_) => "VECTOR",
            NodeKind::Mask(_) => "MASK",
            NodeKind::Text(_) => "TEXT",
            NodeKind::Adjustment(_) => "ADJUSTMENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Group(GroupData),
    Frame(FrameData),
    Rectangle(ShapeData),
    Vector(ShapeData),
    Mask(MaskData),
    Text(TextData),
    Adjustment(AdjustmentData),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(default)]
    pub children: Vec<TargetNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameRole {
    /// Group whose children include clipping layers; children are in frame space.
    Group,
    ClippingGroup,
    LayerMask,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    pub role: FrameRole,
    pub clips_content: bool,
    #[serde(default)]
    pub children: Vec<TargetNode>,
}

/// Image kept in the side channel under `fileName`, optionally inlined as base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    Nonzero,
    Evenodd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorPathData {
    /// SVG path `d` in node-local coordinates.
    pub path_data: String,
    #[serde(default)]
    pub fill_rule: FillRule,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
    Angle,
    Reflected,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// `0..=1` along the gradient axis.
    pub position: f64,
    pub color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    #[serde(rename = "type", default)]
    pub kind: GradientKind,
    pub angle: f64,
    pub stops: Vec<GradientStop>,
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
}

/// Declared vector fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VectorFill {
    Solid { color: Rgba },
    Gradient { gradient: Gradient },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeData {
    pub color: Rgba,
    pub weight: f64,
    pub align: StrokeAlign,
    pub cap: crate::source::model::LineCap,
    pub join: crate::source::model::LineJoin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash_pattern: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineData {
    pub xx: f64,
    pub xy: f64,
    pub yx: f64,
    pub yy: f64,
    pub tx: f64,
    pub ty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedData {
    pub linked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<AffineData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartFilterData {
    #[serde(rename = "type")]
    pub kind: String,
    pub enabled: bool,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// Payload of image and vector layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_path: Option<VectorPathData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_fill: Option<VectorFill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_stroke: Option<StrokeData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed: Option<PlacedData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub smart_filters: Vec<SmartFilterData>,
}

/// What a mask node takes its coverage from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum MaskSource {
    /// Vector shape of the clipping base.
    #[serde(rename_all = "camelCase")]
    Path { path_data: String, fill_rule: FillRule },
    /// Alpha channel of the clipping base's pixels.
    Alpha { image: ImageRef },
    /// Grayscale layer mask; luminance becomes alpha at materialization.
    Luminance { image: ImageRef },
    /// Opaque rectangle covering the node bounds.
    Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskData {
    #[serde(flatten)]
    pub source: MaskSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignH {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

/// How the host should size the text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextSizing {
    /// Box grows to fit, no wrapping.
    Auto,
    /// Width fixed, height grows: paragraph text that wraps.
    Wrap,
    /// Box fixed to the source width/height.
    Fixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRange {
    /// UTF-16 offsets, `[start, end)`.
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    pub characters: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    pub font_size: f64,
    pub color: Rgba,
    /// Pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    /// Em units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default)]
    pub text_align: TextAlignH,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub style_ranges: Vec<StyleRange>,
    pub sizing: TextSizing,
    /// Degrees, clockwise-positive as in the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl TextData {
    pub fn line_count(&self) -> usize {
        self.characters.split('\n').count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentData {
    #[serde(rename = "adjustmentType")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// Alpha carries the effect opacity.
    pub color: Rgba,
    pub offset: Offset,
    pub blur: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    pub color: Rgba,
    pub blur: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeFillType {
    #[default]
    Solid,
    Gradient,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeEffect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    pub size: f64,
    pub position: StrokeAlign,
    pub opacity: f64,
    #[serde(default)]
    pub fill_type: StrokeFillType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerBlur {
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolidFill {
    /// Alpha carries the overlay opacity.
    pub color: Rgba,
    #[serde(default)]
    pub blend_mode: BlendMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Satin {
    pub color: Rgba,
    pub angle: f64,
    pub distance: f64,
    pub size: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    pub invert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BevelEmboss {
    pub style: String,
    pub technique: String,
    pub depth: f64,
    pub direction: String,
    pub size: f64,
    pub soften: f64,
    pub angle: f64,
    pub altitude: f64,
    pub highlight_color: Rgba,
    pub shadow_color: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOverlay {
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

/// Layer effects, flat and keyed by effect name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_shadow: Option<OneOrMany<Shadow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_shadow: Option<OneOrMany<Shadow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_glow: Option<Glow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_glow: Option<Glow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<OneOrMany<StrokeEffect>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_blur: Option<LayerBlur>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solid_fill: Option<SolidFill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient_overlay: Option<Gradient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satin: Option<Satin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bevel_emboss: Option<BevelEmboss>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_overlay: Option<PatternOverlay>,
}

impl Effects {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
