use serde::{Deserialize, Serialize};

use crate::foundation::core::{BezPath, Rgba, Vec2};
use crate::foundation::error::SceneResult;
use crate::materialize::fonts::FontName;
use crate::scene::model::{BlendMode, FillRule, GradientStop, TextAlignH};
use crate::source::model::StrokeAlign;

/// Host-side node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A typed reference to a live host node.
pub trait Handle: Copy {
    fn id(self) -> NodeId;
}

/// Nodes with their own position and size.
pub trait HasGeometry: Handle {}
/// Nodes that carry fills, strokes and effects.
pub trait HasFills: Handle {}
/// Nodes with opacity and blend mode.
pub trait HasBlend: Handle {}
/// Nodes that accept children.
pub trait HasChildren: Handle {}

macro_rules! handle {
    ($name:ident: $($cap:ident),*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub NodeId);

        impl Handle for $name {
            fn id(self) -> NodeId {
                self.0
            }
        }

        $(impl $cap for $name {})*
    };
}

handle!(FrameRef: HasGeometry, HasFills, HasBlend, HasChildren);
handle!(ShapeRef: HasGeometry, HasFills, HasBlend);
handle!(TextRef: HasGeometry, HasFills, HasBlend);
handle!(GroupRef: HasBlend, HasChildren);

/// Registered image payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageHash(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        color: Rgba,
    },
    /// Image scaled to cover the node.
    Image {
        hash: ImageHash,
    },
    GradientLinear {
        stops: Vec<GradientStop>,
        /// Node space to normalized gradient space.
        transform: [[f64; 3]; 2],
        opacity: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NativeEffect {
    DropShadow {
        color: Rgba,
        offset: Vec2,
        radius: f64,
        spread: f64,
    },
    InnerShadow {
        color: Rgba,
        offset: Vec2,
        radius: f64,
        spread: f64,
    },
    LayerBlur {
        radius: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSpec {
    pub color: Rgba,
    pub weight: f64,
    pub align: StrokeAlign,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash_pattern: Vec<f64>,
}

/// How a text box reacts to its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextResize {
    WidthAndHeight,
    Height,
    None,
}

/// Override for a UTF-16 range of a text node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStyle {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub characters: String,
    pub font: FontName,
    pub font_size: f64,
    pub color: Rgba,
    /// Percent of the font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    /// Pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    pub align: TextAlignH,
    pub underline: bool,
    pub strikethrough: bool,
    pub resize: TextResize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<RangeStyle>,
}

/// Live object model the materializer drives.
///
/// Nodes are created detached, configured, then appended. Handle types decide which
/// setters apply to which node.
pub trait Host {
    fn create_frame(&mut self) -> SceneResult<FrameRef>;
    fn create_rectangle(&mut self) -> SceneResult<ShapeRef>;
    fn create_vector(&mut self, path: &BezPath, fill_rule: FillRule) -> SceneResult<ShapeRef>;
    fn create_text(&mut self) -> SceneResult<TextRef>;
    fn create_group(&mut self) -> SceneResult<GroupRef>;
    /// Register raster bytes; fails when they do not decode.
    fn create_image(&mut self, bytes: &[u8]) -> SceneResult<ImageHash>;

    /// Append `child` as the topmost child of `parent`.
    fn append_child<P: HasChildren, C: Handle>(&mut self, parent: P, child: C) -> SceneResult<()>;
    /// Drop a node that was never appended or failed half-way.
    fn remove<C: Handle>(&mut self, node: C);

    fn set_name<C: Handle>(&mut self, node: C, name: &str) -> SceneResult<()>;
    fn set_visible<C: Handle>(&mut self, node: C, visible: bool) -> SceneResult<()>;
    fn set_locked<C: Handle>(&mut self, node: C, locked: bool) -> SceneResult<()>;
    fn set_blend<C: HasBlend>(&mut self, node: C, opacity: f64, mode: BlendMode) -> SceneResult<()>;
    fn set_effects<C: HasBlend>(&mut self, node: C, effects: Vec<NativeEffect>) -> SceneResult<()>;

    fn set_geometry<C: HasGeometry>(
        &mut self,
        node: C,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> SceneResult<()>;
    /// Degrees, counter-clockwise positive.
    fn set_rotation<C: HasGeometry>(&mut self, node: C, degrees: f64) -> SceneResult<()>;

    fn set_fills<C: HasFills>(&mut self, node: C, fills: Vec<Paint>) -> SceneResult<()>;
    fn set_stroke<C: HasFills>(&mut self, node: C, stroke: Option<StrokeSpec>) -> SceneResult<()>;

    fn set_mask(&mut self, node: ShapeRef, is_mask: bool) -> SceneResult<()>;
    fn set_clips_content(&mut self, node: FrameRef, clips: bool) -> SceneResult<()>;
    fn set_text(&mut self, node: TextRef, content: TextContent) -> SceneResult<()>;
}
