use std::ops::ControlFlow;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::assets::decode::{luminance_to_alpha, parse_path_fragment, svg_fragment};
use crate::build::shape::VECTOR_FAILED_SUFFIX;
use crate::foundation::core::{Rgba, clamp_dim, finite_or};
use crate::foundation::error::{SceneError, SceneResult};
use crate::materialize::fonts::{FontResolver, FontSubstitution};
use crate::materialize::host::{
    FrameRef, Handle, HasBlend, HasChildren, HasGeometry, Host, ImageHash, NodeId, Paint,
    ShapeRef, TextRef,
};
use crate::materialize::images::ImageStore;
use crate::materialize::pacing::{NoYield, Progress, YieldHook};
use crate::materialize::paint::{
    MISSING_IMAGE_GRAY, MISSING_IMAGE_PREFIX, PLACEHOLDER_GRAY, fallback_fill, fragment_fill,
    fragment_stroke, native_effects, stroke_spec, text_content,
};
use crate::scene::model::{
    FillRule, FrameData, ImageRef, MaskSource, NodeKind, SceneDocument, ShapeData, TargetNode,
    TextData,
};

pub const FAILED_PREFIX: &str = "[Failed] ";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializeOptions {
    /// Nodes processed between two calls of the yield hook.
    pub yield_every: usize,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self { yield_every: 20 }
    }
}

/// A node that could not be built as described.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedNode {
    pub name: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub root: Option<NodeId>,
    /// Scene nodes visited.
    pub processed: usize,
    /// Host nodes created, root included.
    pub created: usize,
    pub degraded: Vec<DegradedNode>,
    pub missing_images: Vec<String>,
    pub adjustments_skipped: usize,
    pub empty_groups_skipped: usize,
    pub substitutions: Vec<FontSubstitution>,
}

/// One import of a scene document into a host.
pub struct ImportSession<'a, H: Host> {
    host: &'a mut H,
    images: ImageStore,
    fonts: FontResolver,
    hook: Box<dyn YieldHook + 'a>,
    options: MaterializeOptions,
    report: ImportReport,
}

impl<'a, H: Host> ImportSession<'a, H> {
    pub fn new(host: &'a mut H, images: ImageStore, fonts: FontResolver) -> Self {
        Self {
            host,
            images,
            fonts,
            hook: Box::new(NoYield),
            options: MaterializeOptions::default(),
            report: ImportReport::default(),
        }
    }

    pub fn with_options(mut self, options: MaterializeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hook(mut self, hook: impl YieldHook + 'a) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// Instantiate `doc` under a new canvas-sized root frame.
    ///
    /// Only a failed root frame or a cancellation fails the import; every other failure
    /// degrades a single node and is listed in the report.
    #[tracing::instrument(skip_all, fields(document = %doc.name, nodes = doc.node_count()))]
    pub fn import(mut self, doc: &SceneDocument) -> SceneResult<ImportReport> {
        tracing::info!("import started");
        let root = self.root_frame(doc).map_err(|e| {
            SceneError::host(format!("could not create root frame for '{}': {e}", doc.name))
        })?;
        self.report.root = Some(root.id());
        self.report.created += 1;

        self.children(root, &doc.nodes)?;

        let mut report = self.report;
        report.substitutions = self.fonts.substitutions().to_vec();
        tracing::info!(
            processed = report.processed,
            created = report.created,
            degraded = report.degraded.len(),
            "import finished"
        );
        Ok(report)
    }

    fn root_frame(&mut self, doc: &SceneDocument) -> SceneResult<FrameRef> {
        let frame = self.host.create_frame()?;
        self.host.set_name(frame, &doc.name)?;
        self.host.set_geometry(
            frame,
            0.0,
            0.0,
            clamp_dim(doc.canvas.width),
            clamp_dim(doc.canvas.height),
        )?;
        self.host.set_clips_content(frame, true)?;
        self.host
            .set_fills(frame, vec![Paint::Solid { color: Rgba::WHITE }])?;
        Ok(frame)
    }

    fn children<P: HasChildren>(&mut self, parent: P, nodes: &[TargetNode]) -> SceneResult<()> {
        for node in nodes {
            self.node(parent, node)?;
        }
        Ok(())
    }

    /// Yield point, then the node itself. Only cancellation escapes.
    fn node<P: HasChildren>(&mut self, parent: P, node: &TargetNode) -> SceneResult<()> {
        self.report.processed += 1;
        let every = self.options.yield_every.max(1);
        if self.report.processed % every == 0 {
            let progress = Progress {
                processed: self.report.processed,
            };
            tracing::debug!(processed = progress.processed, "yield");
            if let ControlFlow::Break(()) = self.hook.on_yield(progress) {
                return Err(SceneError::Cancelled {
                    processed: self.report.processed,
                });
            }
        }

        match self.instantiate(parent, node) {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(node = %node.name, error = %e, "node degraded to placeholder");
                self.report.degraded.push(DegradedNode {
                    name: node.name.clone(),
                    reason: e.to_string(),
                });
                // A mask stand-in must stay a mask, or it paints over its siblings.
                let fallback = match &node.kind {
                    NodeKind::Mask(_) => self.mask(parent, node, &MaskSource::Rect),
                    _ => self.placeholder(parent, node),
                };
                if let Err(e) = fallback {
                    tracing::warn!(node = %node.name, error = %e, "placeholder also failed");
                }
                Ok(())
            }
        }
    }

    fn instantiate<P: HasChildren>(&mut self, parent: P, node: &TargetNode) -> SceneResult<()> {
        match &node.kind {
            NodeKind::Adjustment(a) => {
                tracing::debug!(node = %node.name, kind = %a.kind, "adjustment skipped");
                self.report.adjustments_skipped += 1;
                Ok(())
            }
            NodeKind::Group(g) if g.children.is_empty() => {
                self.report.empty_groups_skipped += 1;
                Ok(())
            }
            NodeKind::Group(g) => {
                let group = self.host.create_group()?;
                self.attach(parent, group, |s| s.common(group, node))?;
                self.children(group, &g.children)
            }
            NodeKind::Frame(f) => {
                let frame = self.host.create_frame()?;
                self.attach(parent, frame, |s| s.frame(frame, node, f))?;
                self.children(frame, &f.children)
            }
            NodeKind::Rectangle(shape) | NodeKind::Vector(shape) => self.shape(parent, node, shape),
            NodeKind::Mask(m) => self.mask(parent, node, &m.source),
            NodeKind::Text(t) => {
                let text = self.host.create_text()?;
                self.attach(parent, text, |s| s.text(text, node, t))
            }
        }
    }

    /// Configure a detached node, then append it. A node whose configuration fails is
    /// removed again.
    fn attach<P: HasChildren, C: Handle>(
        &mut self,
        parent: P,
        child: C,
        configure: impl FnOnce(&mut Self) -> SceneResult<()>,
    ) -> SceneResult<()> {
        let res = configure(self).and_then(|()| self.host.append_child(parent, child));
        match res {
            Ok(()) => {
                self.report.created += 1;
                Ok(())
            }
            Err(e) => {
                self.host.remove(child);
                Err(e)
            }
        }
    }

    fn common<C: HasBlend>(&mut self, h: C, node: &TargetNode) -> SceneResult<()> {
        self.host.set_name(h, &node.name)?;
        self.host.set_visible(h, node.visible)?;
        if node.locked {
            self.host.set_locked(h, true)?;
        }
        self.host
            .set_blend(h, finite_or(node.opacity, 1.0).clamp(0.0, 1.0), node.blend_mode)?;
        if let Some(fx) = &node.effects {
            let native = native_effects(fx);
            if !native.is_empty() {
                self.host.set_effects(h, native)?;
            }
        }
        Ok(())
    }

    fn geometry<C: HasGeometry>(&mut self, h: C, node: &TargetNode) -> SceneResult<()> {
        self.host.set_geometry(
            h,
            finite_or(node.x, 0.0),
            finite_or(node.y, 0.0),
            clamp_dim(node.width),
            clamp_dim(node.height),
        )
    }

    fn frame(&mut self, h: FrameRef, node: &TargetNode, f: &FrameData) -> SceneResult<()> {
        self.common(h, node)?;
        self.geometry(h, node)?;
        self.host.set_clips_content(h, f.clips_content)?;
        self.host.set_fills(h, Vec::new())
    }

    /// Decoded image for a reference: inline payload first, then the store.
    fn image(&mut self, r: &ImageRef) -> Option<ImageHash> {
        let bytes = match &r.data {
            Some(b64) => match STANDARD.decode(b64.trim()) {
                Ok(b) => Some(std::borrow::Cow::Owned(b)),
                Err(e) => {
                    tracing::warn!(image = %r.file_name, error = %e, "inline image is not base64");
                    None
                }
            },
            None => self.images.get(&r.file_name),
        };
        let Some(bytes) = bytes else {
            tracing::debug!(image = %r.file_name, "image not in store");
            return None;
        };
        match self.host.create_image(&bytes) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(image = %r.file_name, error = %e, "image failed to load");
                None
            }
        }
    }

    fn shape<P: HasChildren>(
        &mut self,
        parent: P,
        node: &TargetNode,
        shape: &ShapeData,
    ) -> SceneResult<()> {
        let effects = node.effects.as_ref();
        let mut name = node.name.clone();

        let mut fills = Vec::new();
        if let Some(r) = &shape.image {
            match self.image(r) {
                Some(hash) => fills.push(Paint::Image { hash }),
                None => self.report.missing_images.push(r.file_name.clone()),
            }
        }
        if fills.is_empty() {
            match fallback_fill(shape, effects) {
                Some(p) => fills.push(p),
                None if shape.image.is_some() => {
                    fills.push(Paint::Solid {
                        color: Rgba::gray(MISSING_IMAGE_GRAY),
                    });
                    name = format!("{MISSING_IMAGE_PREFIX}{name}");
                }
                None => fills.push(Paint::Solid {
                    color: Rgba::gray(PLACEHOLDER_GRAY),
                }),
            }
        }

        let h = match &shape.vector_path {
            Some(vp) => match self.vector(node, shape, &vp.path_data, vp.fill_rule) {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(node = %node.name, error = %e, "vector realization failed");
                    if !name.ends_with(VECTOR_FAILED_SUFFIX) {
                        name.push_str(VECTOR_FAILED_SUFFIX);
                    }
                    self.host.create_rectangle()?
                }
            },
            None => self.host.create_rectangle()?,
        };

        let stroke = stroke_spec(shape, effects);
        self.attach(parent, h, |s| {
            s.common(h, node)?;
            s.host.set_name(h, &name)?;
            s.geometry(h, node)?;
            s.host.set_fills(h, fills)?;
            if stroke.is_some() {
                s.host.set_stroke(h, stroke)?;
            }
            Ok(())
        })
    }

    /// Realize a path through an SVG fragment so the host gets its own vector geometry.
    fn vector(
        &mut self,
        node: &TargetNode,
        shape: &ShapeData,
        path_data: &str,
        fill_rule: FillRule,
    ) -> SceneResult<ShapeRef> {
        let (hex, alpha) = fragment_fill(shape, node.effects.as_ref());
        let stroke = fragment_stroke(shape);
        let svg = svg_fragment(
            path_data,
            fill_rule,
            Some((&hex, alpha)),
            stroke.as_ref(),
            clamp_dim(node.width),
            clamp_dim(node.height),
        );
        let parsed = parse_path_fragment(&svg)?;
        self.host.create_vector(&parsed.path, parsed.fill_rule)
    }

    fn mask<P: HasChildren>(
        &mut self,
        parent: P,
        node: &TargetNode,
        source: &MaskSource,
    ) -> SceneResult<()> {
        let (h, fills) = match source {
            MaskSource::Path {
                path_data,
                fill_rule,
            } => {
                let svg = svg_fragment(
                    path_data,
                    *fill_rule,
                    Some(("#000000", 1.0)),
                    None,
                    clamp_dim(node.width),
                    clamp_dim(node.height),
                );
                let parsed = parse_path_fragment(&svg)?;
                let h = self.host.create_vector(&parsed.path, parsed.fill_rule)?;
                (h, vec![Paint::Solid { color: Rgba::gray(0.0) }])
            }
            MaskSource::Alpha { image } => {
                let hash = self.image(image).ok_or_else(|| {
                    SceneError::decode(format!("mask image '{}' unavailable", image.file_name))
                })?;
                (self.host.create_rectangle()?, vec![Paint::Image { hash }])
            }
            MaskSource::Luminance { image } => {
                let bytes = self.luminance_bytes(image)?;
                let alpha = luminance_to_alpha(&bytes)?;
                let hash = self.host.create_image(&alpha)?;
                (self.host.create_rectangle()?, vec![Paint::Image { hash }])
            }
            MaskSource::Rect => (
                self.host.create_rectangle()?,
                vec![Paint::Solid { color: Rgba::gray(0.0) }],
            ),
        };

        self.attach(parent, h, |s| {
            s.common(h, node)?;
            s.geometry(h, node)?;
            s.host.set_fills(h, fills)?;
            s.host.set_mask(h, true)
        })
    }

    fn luminance_bytes(&self, image: &ImageRef) -> SceneResult<Vec<u8>> {
        match &image.data {
            Some(b64) => STANDARD
                .decode(b64.trim())
                .map_err(|e| SceneError::decode(format!("mask '{}': {e}", image.file_name))),
            None => self
                .images
                .get(&image.file_name)
                .map(|b| b.into_owned())
                .ok_or_else(|| {
                    SceneError::decode(format!("mask image '{}' unavailable", image.file_name))
                }),
        }
    }

    fn text(&mut self, h: TextRef, node: &TargetNode, t: &TextData) -> SceneResult<()> {
        let font = self.fonts.resolve(&t.font_family, t.font_style.as_deref());
        self.common(h, node)?;
        self.host.set_text(h, text_content(t, font))?;
        self.geometry(h, node)?;
        if let Some(r) = t.rotation.filter(|r| r.is_finite() && *r != 0.0) {
            self.host.set_rotation(h, -r)?;
        }
        Ok(())
    }

    fn placeholder<P: HasChildren>(&mut self, parent: P, node: &TargetNode) -> SceneResult<()> {
        let h = self.host.create_rectangle()?;
        self.attach(parent, h, |s| {
            s.host.set_name(h, &format!("{FAILED_PREFIX}{}", node.name))?;
            s.host.set_visible(h, node.visible)?;
            s.geometry(h, node)?;
            s.host.set_fills(
                h,
                vec![Paint::Solid {
                    color: Rgba::gray(PLACEHOLDER_GRAY),
                }],
            )
        })
    }
}

/// Shorthand for an import with default options and no yielding.
pub fn import<H: Host>(
    host: &mut H,
    doc: &SceneDocument,
    images: ImageStore,
    fonts: FontResolver,
) -> SceneResult<ImportReport> {
    ImportSession::new(host, images, fonts).import(doc)
}

#[cfg(test)]
#[path = "../../tests/unit/materialize/materializer.rs"]
mod tests;
