use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::assets::decode::{decode_image, encode_png};
use crate::foundation::core::BezPath;
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::Fnv1a64;
use crate::materialize::host::{
    FrameRef, GroupRef, Handle, HasBlend, HasChildren, HasFills, HasGeometry, Host, ImageHash,
    NativeEffect, NodeId, Paint, ShapeRef, StrokeSpec, TextContent, TextRef,
};
use crate::scene::model::{BlendMode, FillRule};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostNodeKind {
    #[serde(rename_all = "camelCase")]
    Frame { clips_content: bool },
    Rectangle,
    #[serde(rename_all = "camelCase")]
    Vector { path: BezPath, fill_rule: FillRule },
    Text { content: Option<TextContent> },
    Group,
}

/// One live node of a [`SceneHost`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNode {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub kind: HostNodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, counter-clockwise positive.
    pub rotation: f64,
    pub opacity: f64,
    pub blend_mode: BlendMode,
    pub visible: bool,
    pub locked: bool,
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<NativeEffect>,
    pub is_mask: bool,
}

impl HostNode {
    fn new(id: NodeId, kind: HostNodeKind) -> Self {
        Self {
            id,
            name: String::new(),
            kind,
            parent: None,
            children: Vec::new(),
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            locked: false,
            fills: Vec::new(),
            stroke: None,
            effects: Vec::new(),
            is_mask: false,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.kind {
            HostNodeKind::Text { content } => content.as_ref(),
            _ => None,
        }
    }
}

/// Decoded image registered with the host, re-encoded as PNG.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// In-memory object model: an arena of nodes addressed by [`NodeId`].
#[derive(Clone, Debug, Default)]
pub struct SceneHost {
    nodes: Vec<Option<HostNode>>,
    images: BTreeMap<ImageHash, HostImage>,
    node_limit: Option<usize>,
    live: usize,
}

#[derive(Serialize)]
struct Dump<'a> {
    roots: Vec<NodeId>,
    nodes: Vec<&'a HostNode>,
    images: Vec<DumpImage<'a>>,
}

#[derive(Serialize)]
struct DumpImage<'a> {
    hash: &'a ImageHash,
    width: u32,
    height: u32,
    bytes: usize,
}

impl SceneHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that refuses to hold more than `limit` live nodes.
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            node_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live nodes without a parent, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = &HostNode> {
        self.nodes.iter().flatten().filter(|n| n.parent.is_none())
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &HostNode> {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|c| self.node(*c))
    }

    /// Depth-first, parent before children.
    pub fn descendants(&self, id: NodeId) -> Vec<&HostNode> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = vec![id];
        while let Some(next) = stack.pop() {
            let Some(n) = self.node(next) else { continue };
            out.push(n);
            stack.extend(n.children.iter().rev().copied());
        }
        out
    }

    pub fn find_by_name(&self, name: &str) -> Option<&HostNode> {
        self.nodes.iter().flatten().find(|n| n.name == name)
    }

    pub fn image(&self, hash: &ImageHash) -> Option<&HostImage> {
        self.images.get(hash)
    }

    /// Pretty JSON dump of every live node and image.
    pub fn write_dump<W: Write>(&self, w: W) -> SceneResult<()> {
        let dump = Dump {
            roots: self.roots().map(|n| n.id).collect(),
            nodes: self.nodes.iter().flatten().collect(),
            images: self
                .images
                .iter()
                .map(|(hash, img)| DumpImage {
                    hash,
                    width: img.width,
                    height: img.height,
                    bytes: img.png.len(),
                })
                .collect(),
        };
        serde_json::to_writer_pretty(w, &dump)
            .map_err(|e| SceneError::serde(format!("host dump: {e}")))
    }

    fn insert(&mut self, kind: HostNodeKind) -> SceneResult<NodeId> {
        if let Some(limit) = self.node_limit
            && self.live >= limit
        {
            return Err(SceneError::host(format!("node limit of {limit} reached")));
        }
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .map_err(|_| SceneError::host("node arena is full"))?,
        );
        self.nodes.push(Some(HostNode::new(id, kind)));
        self.live += 1;
        Ok(id)
    }

    fn get_mut(&mut self, id: NodeId) -> SceneResult<&mut HostNode> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| SceneError::host(format!("node {} does not exist", id.0)))
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cur = Some(of);
        while let Some(id) = cur {
            if id == candidate {
                return true;
            }
            cur = self.node(id).and_then(|n| n.parent);
        }
        false
    }
}

impl Host for SceneHost {
    fn create_frame(&mut self) -> SceneResult<FrameRef> {
        self.insert(HostNodeKind::Frame {
            clips_content: false,
        })
        .map(FrameRef)
    }

    fn create_rectangle(&mut self) -> SceneResult<ShapeRef> {
        self.insert(HostNodeKind::Rectangle).map(ShapeRef)
    }

    fn create_vector(&mut self, path: &BezPath, fill_rule: FillRule) -> SceneResult<ShapeRef> {
        if path.elements().is_empty() {
            return Err(SceneError::geometry("vector path is empty"));
        }
        self.insert(HostNodeKind::Vector {
            path: path.clone(),
            fill_rule,
        })
        .map(ShapeRef)
    }

    fn create_text(&mut self) -> SceneResult<TextRef> {
        self.insert(HostNodeKind::Text { content: None }).map(TextRef)
    }

    fn create_group(&mut self) -> SceneResult<GroupRef> {
        self.insert(HostNodeKind::Group).map(GroupRef)
    }

    fn create_image(&mut self, bytes: &[u8]) -> SceneResult<ImageHash> {
        let mut h = Fnv1a64::new_default();
        h.write_bytes(bytes);
        let hash = ImageHash(format!("img{:016x}", h.finish()));
        if !self.images.contains_key(&hash) {
            let decoded = decode_image(bytes)?;
            let png = encode_png(&decoded)?;
            self.images.insert(
                hash.clone(),
                HostImage {
                    width: decoded.width,
                    height: decoded.height,
                    png,
                },
            );
        }
        Ok(hash)
    }

    fn append_child<P: HasChildren, C: Handle>(&mut self, parent: P, child: C) -> SceneResult<()> {
        let (p, c) = (parent.id(), child.id());
        if self.is_ancestor(c, p) {
            return Err(SceneError::host("cannot append a node into itself"));
        }
        if let Some(old) = self.get_mut(c)?.parent.take() {
            self.get_mut(old)?.children.retain(|x| *x != c);
        }
        self.get_mut(p)?.children.push(c);
        self.get_mut(c)?.parent = Some(p);
        Ok(())
    }

    fn remove<C: Handle>(&mut self, node: C) {
        let id = node.id();
        let mut stack = vec![id];
        if let Some(parent) = self.node(id).and_then(|n| n.parent)
            && let Ok(p) = self.get_mut(parent)
        {
            p.children.retain(|x| *x != id);
        }
        while let Some(next) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(next.0 as usize) else {
                continue;
            };
            if let Some(n) = slot.take() {
                self.live -= 1;
                stack.extend(n.children);
            }
        }
    }

    fn set_name<C: Handle>(&mut self, node: C, name: &str) -> SceneResult<()> {
        self.get_mut(node.id())?.name = name.to_owned();
        Ok(())
    }

    fn set_visible<C: Handle>(&mut self, node: C, visible: bool) -> SceneResult<()> {
        self.get_mut(node.id())?.visible = visible;
        Ok(())
    }

    fn set_locked<C: Handle>(&mut self, node: C, locked: bool) -> SceneResult<()> {
        self.get_mut(node.id())?.locked = locked;
        Ok(())
    }

    fn set_blend<C: HasBlend>(
        &mut self,
        node: C,
        opacity: f64,
        mode: BlendMode,
    ) -> SceneResult<()> {
        let n = self.get_mut(node.id())?;
        n.opacity = opacity;
        n.blend_mode = mode;
        Ok(())
    }

    fn set_effects<C: HasBlend>(&mut self, node: C, effects: Vec<NativeEffect>) -> SceneResult<()> {
        self.get_mut(node.id())?.effects = effects;
        Ok(())
    }

    fn set_geometry<C: HasGeometry>(
        &mut self,
        node: C,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> SceneResult<()> {
        if ![x, y, width, height].iter().all(|v| v.is_finite()) || width <= 0.0 || height <= 0.0
        {
            return Err(SceneError::geometry(format!(
                "invalid geometry {x},{y} {width}x{height}"
            )));
        }
        let n = self.get_mut(node.id())?;
        n.x = x;
        n.y = y;
        n.width = width;
        n.height = height;
        Ok(())
    }

    fn set_rotation<C: HasGeometry>(&mut self, node: C, degrees: f64) -> SceneResult<()> {
        self.get_mut(node.id())?.rotation = degrees;
        Ok(())
    }

    fn set_fills<C: HasFills>(&mut self, node: C, fills: Vec<Paint>) -> SceneResult<()> {
        for f in &fills {
            if let Paint::Image { hash } = f
                && !self.images.contains_key(hash)
            {
                return Err(SceneError::host(format!("unknown image {}", hash.0)));
            }
        }
        self.get_mut(node.id())?.fills = fills;
        Ok(())
    }

    fn set_stroke<C: HasFills>(&mut self, node: C, stroke: Option<StrokeSpec>) -> SceneResult<()> {
        self.get_mut(node.id())?.stroke = stroke;
        Ok(())
    }

    fn set_mask(&mut self, node: ShapeRef, is_mask: bool) -> SceneResult<()> {
        self.get_mut(node.id())?.is_mask = is_mask;
        Ok(())
    }

    fn set_clips_content(&mut self, node: FrameRef, clips: bool) -> SceneResult<()> {
        match &mut self.get_mut(node.id())?.kind {
            HostNodeKind::Frame { clips_content } => {
                *clips_content = clips;
                Ok(())
            }
            _ => Err(SceneError::host("clips-content on a non-frame node")),
        }
    }

    fn set_text(&mut self, node: TextRef, content: TextContent) -> SceneResult<()> {
        match &mut self.get_mut(node.id())?.kind {
            HostNodeKind::Text { content: slot } => {
                *slot = Some(content);
                Ok(())
            }
            _ => Err(SceneError::host("text content on a non-text node")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/scene_host.rs"]
mod tests;
