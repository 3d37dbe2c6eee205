use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::build::clipping::segment_clipping_groups;
use crate::build::images::{ImageExport, ImageRole, ImageSink};
use crate::build::shape::{VECTOR_FAILED_SUFFIX, build_shape};
use crate::build::text::{WrapHeuristic, build_text};
use crate::foundation::core::{Bounds, Vec2, clamp_dim};
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::stable_node_id;
use crate::normalize::effects::normalize_effects;
use crate::scene::model::{
    AdjustmentData, BlendMode, Canvas, Effects, FORMAT_VERSION, FrameData, FrameRole, Grid,
    GroupData, Guide, MaskData, MaskSource, NodeKind, Resolution, SceneDocument, ShapeData,
    Slice, TargetNode,
};
use crate::source::model::{LayerKind, LayerRole, RasterRef, SourceDocument, SourceLayer};

/// Name tags for nodes the builder synthesizes.
pub const CLIPPING_GROUP_SUFFIX: &str = " [Clipping Group]";
pub const CLIP_MASK_SUFFIX: &str = " [Clip Mask]";
pub const LAYER_MASK_SUFFIX: &str = " [Layer Mask]";
pub const BUILD_FAILED_PREFIX: &str = "[Build Failed] ";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Nest group children; when off, group contents are spliced into the parent list.
    pub preserve_groups: bool,
    /// Export raster payloads; when off, image layers become placeholders.
    pub export_images: bool,
    pub images: ImageExport,
    pub wrap: WrapHeuristic,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            preserve_groups: true,
            export_images: true,
            images: ImageExport::Memory,
            wrap: WrapHeuristic::default(),
        }
    }
}

/// Layer counts gathered during one conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    pub total_layers: usize,
    pub groups: usize,
    pub text_layers: usize,
    pub image_layers: usize,
    pub shape_layers: usize,
    pub adjustment_layers: usize,
    pub smart_filter_layers: usize,
    /// Layers replaced by a placeholder.
    pub failed_layers: usize,
}

/// Result of converting one source document.
#[derive(Debug)]
pub struct Conversion {
    pub document: SceneDocument,
    /// In-memory image side channel, keyed by file name. Empty in streaming mode.
    pub images: BTreeMap<String, Vec<u8>>,
    pub summary: ConversionSummary,
}

/// Translates source layer trees into intermediate scene documents.
#[derive(Clone, Debug, Default)]
pub struct SceneBuilder {
    options: BuildOptions,
}

impl SceneBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Convert a whole document. Only an unusable image directory fails the call; single
    /// layers that cannot be converted become placeholders.
    #[tracing::instrument(skip_all, fields(document = %doc.name))]
    pub fn build(&self, doc: &SourceDocument) -> SceneResult<Conversion> {
        if !(doc.width.is_finite() && doc.height.is_finite())
            || doc.width <= 0.0
            || doc.height <= 0.0
        {
            return Err(SceneError::validation(format!(
                "document '{}' has no usable canvas ({}x{})",
                doc.name, doc.width, doc.height
            )));
        }

        let mut session = Session {
            options: &self.options,
            document: &doc.name,
            sink: ImageSink::new(self.options.images.clone())?,
            summary: ConversionSummary::default(),
        };
        let nodes = session.siblings(&doc.layers, &[], Vec2::ZERO);
        let Session { sink, summary, .. } = session;

        tracing::info!(
            layers = summary.total_layers,
            failed = summary.failed_layers,
            streamed = sink.streamed_count(),
            "conversion finished"
        );

        let document = SceneDocument {
            version: FORMAT_VERSION.to_owned(),
            name: doc.name.clone(),
            canvas: Canvas {
                width: doc.width,
                height: doc.height,
            },
            nodes,
            guides: (!doc.guides.is_empty()).then(|| {
                doc.guides
                    .iter()
                    .map(|g| Guide {
                        position: g.location,
                        direction: g.direction,
                    })
                    .collect()
            }),
            grid: doc.grid.map(|g| Grid {
                horizontal: g.horizontal,
                vertical: g.vertical,
                subdivisions: g.subdivisions,
            }),
            slices: (!doc.slices.is_empty()).then(|| {
                doc.slices
                    .iter()
                    .map(|s| Slice {
                        id: s.id,
                        name: s.name.clone(),
                        x: s.bounds.x,
                        y: s.bounds.y,
                        width: s.bounds.width,
                        height: s.bounds.height,
                        url: s.url.clone(),
                    })
                    .collect()
            }),
            resolution: doc.resolution.map(|r| Resolution {
                horizontal: r.horizontal,
                horizontal_unit: r.horizontal_unit,
                vertical: r.vertical,
                vertical_unit: r.vertical_unit,
            }),
        };

        Ok(Conversion {
            document,
            images: sink.into_files(),
            summary,
        })
    }
}

/// Pure tree transform: no I/O, images embedded inline, default options.
pub fn build_tree(layers: &[SourceLayer]) -> Vec<TargetNode> {
    let options = BuildOptions {
        images: ImageExport::Inline,
        ..BuildOptions::default()
    };
    let mut session = Session {
        options: &options,
        document: "",
        sink: ImageSink::inline(),
        summary: ConversionSummary::default(),
    };
    session.siblings(layers, &[], Vec2::ZERO)
}

/// A source layer together with its index path in the source tree.
struct Entry<'a> {
    layer: &'a SourceLayer,
    path: Vec<u32>,
}

struct Session<'a> {
    options: &'a BuildOptions,
    document: &'a str,
    sink: ImageSink,
    summary: ConversionSummary,
}

fn child_path(parent: &[u32], i: usize) -> Vec<u32> {
    let mut p = Vec::with_capacity(parent.len() + 1);
    p.extend_from_slice(parent);
    p.push(u32::try_from(i).unwrap_or(u32::MAX));
    p
}

fn frame_bounds(bounds: Bounds, origin: Vec2) -> (f64, f64, f64, f64) {
    let rel = bounds.relative_to(origin);
    let (w, h) = bounds.clamped_size();
    (rel.x, rel.y, w, h)
}

fn layer_opacity(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 }
}

impl<'a> Session<'a> {
    fn id(&self, path: &[u32], role: &str) -> String {
        stable_node_id(self.document, path, role)
    }

    /// Sibling list, with groups spliced in place when groups are not preserved.
    fn entries<'l>(&mut self, layers: &'l [SourceLayer], parent: &[u32], out: &mut Vec<Entry<'l>>) {
        for (i, layer) in layers.iter().enumerate() {
            let path = child_path(parent, i);
            match layer.role() {
                LayerRole::Group(children) if !self.options.preserve_groups => {
                    self.summary.total_layers += 1;
                    self.summary.groups += 1;
                    self.entries(children, &path, out);
                }
                _ => out.push(Entry { layer, path }),
            }
        }
    }

    /// Emit one sibling list in coordinates relative to `origin`.
    fn siblings(
        &mut self,
        layers: &[SourceLayer],
        parent: &[u32],
        origin: Vec2,
    ) -> Vec<TargetNode> {
        let mut entries = Vec::with_capacity(layers.len());
        self.entries(layers, parent, &mut entries);

        let groups = segment_clipping_groups(&entries, |e| e.layer.clipping);
        let mut out = Vec::with_capacity(groups.len());
        for g in groups {
            if g.has_clipped() {
                out.push(self.clipping_group(&entries[g.base], &entries[g.clipped], origin));
            } else {
                out.push(self.layer(&entries[g.base], origin));
            }
        }
        out
    }

    /// Container sized to the base; a mask shaped like the base, the base at (0,0) and the
    /// clipped layers at their offset from the base.
    fn clipping_group(
        &mut self,
        base: &Entry<'_>,
        clipped: &[Entry<'_>],
        origin: Vec2,
    ) -> TargetNode {
        let bounds = base.layer.bounds;
        let frame_origin = bounds.origin();

        let base_node = self.layer(base, frame_origin);
        let mask = self.clip_mask(base, &base_node);
        let mut children = Vec::with_capacity(clipped.len() + 2);
        children.push(mask);
        children.push(base_node);
        for e in clipped {
            children.push(self.layer(e, frame_origin));
        }

        let rel = bounds.relative_to(origin);
        let (width, height) = bounds.clamped_size();
        TargetNode {
            id: self.id(&base.path, "clipping-group"),
            name: format!("{}{CLIPPING_GROUP_SUFFIX}", base.layer.name),
            x: rel.x,
            y: rel.y,
            width,
            height,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: base.layer.visible,
            color: None,
            locked: false,
            kind: NodeKind::Frame(FrameData {
                role: FrameRole::ClippingGroup,
                clips_content: true,
                children,
            }),
            effects: None,
        }
    }

    /// Mask from the already emitted base: its vector path, else its pixels, else its box.
    fn clip_mask(&self, base: &Entry<'_>, base_node: &TargetNode) -> TargetNode {
        let source = match &base_node.kind {
            NodeKind::Rectangle(s) | NodeKind::Vector(s) => match (&s.vector_path, &s.image) {
                (Some(p), _) => MaskSource::Path {
                    path_data: p.path_data.clone(),
                    fill_rule: p.fill_rule,
                },
                (None, Some(image)) => MaskSource::Alpha {
                    image: image.clone(),
                },
                (None, None) => MaskSource::Rect,
            },
            _ => MaskSource::Rect,
        };
        TargetNode {
            id: self.id(&base.path, "clip-mask"),
            name: format!("{}{CLIP_MASK_SUFFIX}", base.layer.name),
            x: base_node.x,
            y: base_node.y,
            width: base_node.width,
            height: base_node.height,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            color: None,
            locked: false,
            kind: NodeKind::Mask(MaskData { source }),
            effects: None,
        }
    }

    /// One layer, wrapped by its layer mask when the mask hides anything. Failures become a
    /// placeholder and never escape.
    fn layer(&mut self, entry: &Entry<'_>, origin: Vec2) -> TargetNode {
        self.summary.total_layers += 1;
        match self.try_layer(entry, origin) {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!(
                    layer = %entry.layer.name,
                    error = %e,
                    "layer replaced by placeholder"
                );
                self.summary.failed_layers += 1;
                self.placeholder(entry, origin)
            }
        }
    }

    fn try_layer(&mut self, entry: &Entry<'_>, origin: Vec2) -> SceneResult<TargetNode> {
        let layer = entry.layer;
        let mask = layer
            .mask
            .as_ref()
            .filter(|m| m.hides_outside() && !m.bounds.is_empty());

        let Some(mask) = mask else {
            let mut node = self.content(entry, origin)?;
            self.apply_common(&mut node, layer);
            return Ok(node);
        };

        let mask_origin = mask.bounds.origin();
        let mut content = self.content(entry, mask_origin)?;
        content.visible = true;
        content.opacity = 1.0;
        content.blend_mode = BlendMode::Normal;

        let (width, height) = mask.bounds.clamped_size();
        let mut children = Vec::with_capacity(2);
        if let Some(raster) = &mask.image {
            match self.sink.export(&layer.name, ImageRole::Mask, raster) {
                Ok(image) => children.push(TargetNode {
                    id: self.id(&entry.path, "layer-mask"),
                    name: format!("{}{LAYER_MASK_SUFFIX}", layer.name),
                    x: 0.0,
                    y: 0.0,
                    width,
                    height,
                    opacity: 1.0,
                    blend_mode: BlendMode::Normal,
                    visible: true,
                    color: None,
                    locked: false,
                    kind: NodeKind::Mask(MaskData {
                        source: MaskSource::Luminance { image },
                    }),
                    effects: None,
                }),
                Err(e) => {
                    tracing::warn!(
                        layer = %layer.name,
                        error = %e,
                        "mask image dropped, clipping to mask bounds"
                    );
                }
            }
        }
        children.push(content);

        let rel = mask.bounds.relative_to(origin);
        let mut wrapper = TargetNode {
            id: self.id(&entry.path, "mask-frame"),
            name: layer.name.clone(),
            x: rel.x,
            y: rel.y,
            width,
            height,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            color: None,
            locked: false,
            kind: NodeKind::Frame(FrameData {
                role: FrameRole::LayerMask,
                clips_content: true,
                children,
            }),
            effects: None,
        };
        self.apply_common(&mut wrapper, layer);
        Ok(wrapper)
    }

    fn apply_common(&self, node: &mut TargetNode, layer: &SourceLayer) {
        if !node.name.ends_with(VECTOR_FAILED_SUFFIX) {
            node.name = layer.name.clone();
        }
        node.visible = layer.visible;
        node.opacity = layer_opacity(layer.opacity);
        node.blend_mode = BlendMode::from_source(&layer.blend_mode);
        node.color = layer.color.clone().filter(|c| !c.is_empty() && c != "none");
        node.locked = layer.locked;
    }

    fn effects(&mut self, layer: &SourceLayer) -> Option<Effects> {
        let src = layer.effects.as_ref()?;
        let sink = &mut self.sink;
        let name = &layer.name;
        let mut export = |raster: &RasterRef| match sink.export(name, ImageRole::Pattern, raster) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(layer = %name, error = %e, "pattern image dropped");
                None
            }
        };
        let fx = normalize_effects(src, &mut export);
        (!fx.is_empty()).then_some(fx)
    }

    /// The layer's own node, positioned relative to `origin`, before common properties.
    fn content(&mut self, entry: &Entry<'_>, origin: Vec2) -> SceneResult<TargetNode> {
        let layer = entry.layer;
        let (x, y, mut width, mut height) = frame_bounds(layer.bounds, origin);
        let mut name = layer.name.clone();

        if !layer.smart_filters.is_empty() {
            self.summary.smart_filter_layers += 1;
        }

        let kind = match layer.role() {
            LayerRole::Group(children) => {
                self.summary.groups += 1;
                if layer.has_clipping_children() {
                    NodeKind::Frame(FrameData {
                        role: FrameRole::Group,
                        clips_content: true,
                        children: self.siblings(children, &entry.path, layer.bounds.origin()),
                    })
                } else {
                    NodeKind::Group(GroupData {
                        children: self.siblings(children, &entry.path, origin),
                    })
                }
            }
            LayerRole::Text(text) => {
                self.summary.text_layers += 1;
                let (data, text_box) = build_text(text, layer.bounds, &self.options.wrap);
                width = clamp_dim(text_box.width);
                height = clamp_dim(text_box.height);
                NodeKind::Text(data)
            }
            LayerRole::Adjustment(adj) => {
                self.summary.adjustment_layers += 1;
                NodeKind::Adjustment(AdjustmentData {
                    kind: adj.map_or_else(|| "unknown".to_owned(), |a| a.kind.clone()),
                    params: adj.map(|a| a.params.clone()).unwrap_or_default(),
                })
            }
            LayerRole::Shape => {
                if layer.image.is_some() {
                    self.summary.image_layers += 1;
                }
                if layer.kind == LayerKind::Vector {
                    self.summary.shape_layers += 1;
                }
                let built = build_shape(layer, &mut self.sink, self.options.export_images)?;
                if let Some(suffix) = built.name_suffix {
                    name.push_str(suffix);
                }
                built.kind
            }
        };

        Ok(TargetNode {
            id: self.id(&entry.path, "layer"),
            name,
            x,
            y,
            width,
            height,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            visible: true,
            color: None,
            locked: false,
            kind,
            effects: self.effects(layer),
        })
    }

    fn placeholder(&self, entry: &Entry<'_>, origin: Vec2) -> TargetNode {
        let (x, y, width, height) = frame_bounds(entry.layer.bounds, origin);
        TargetNode {
            id: self.id(&entry.path, "placeholder"),
            name: format!("{BUILD_FAILED_PREFIX}{}", entry.layer.name),
            x,
            y,
            width,
            height,
            opacity: layer_opacity(entry.layer.opacity),
            blend_mode: BlendMode::Normal,
            visible: entry.layer.visible,
            color: None,
            locked: false,
            kind: NodeKind::Rectangle(ShapeData::default()),
            effects: None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/build/builder.rs"]
mod tests;
