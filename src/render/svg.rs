//! SVG reconstruction of a materialized host tree.
//!
//! Host semantics map onto SVG as follows:
//! - frames are translated groups; `clipsContent` becomes a `clipPath` over the frame box
//! - groups add no coordinate space
//! - a node flagged as mask becomes an alpha `<mask>` applied to the siblings painted after it
//! - image paints are embedded PNG data URIs scaled to cover the node
//! - drop shadows and layer blur become filter primitives; inner shadows are not drawn

use std::fmt::Write as _;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::assets::fontdb::style_traits;
use crate::foundation::core::{Affine, Rgba};
use crate::foundation::error::{SceneError, SceneResult};
use crate::materialize::host::{NativeEffect, NodeId, Paint, StrokeSpec, TextContent};
use crate::materialize::scene_host::{HostNode, HostNodeKind, SceneHost};
use crate::scene::model::{BlendMode, FillRule, TextAlignH};

/// Ascent used to place the first baseline, as a fraction of the font size.
const ASCENT: f64 = 0.8;
const DEFAULT_LINE_HEIGHT: f64 = 1.2;

/// SVG document for the subtree under `root`, sized to the root node.
pub fn to_svg(host: &SceneHost, root: NodeId) -> SceneResult<String> {
    let node = host
        .node(root)
        .ok_or_else(|| SceneError::validation(format!("node {} is not in the host", root.0)))?;

    let mut w = SvgWriter {
        host,
        defs: String::new(),
        next_id: 0,
    };
    let mut body = String::new();
    // The root frame is drawn at the origin whatever its own position.
    let at_origin = HostNode {
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        ..node.clone()
    };
    w.node(&at_origin, &mut body);

    let (width, height) = (node.width, node.height);
    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><defs>{}</defs>{body}</svg>"#,
        w.defs
    ))
}

struct SvgWriter<'a> {
    host: &'a SceneHost,
    defs: String,
    next_id: u32,
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

fn fmt_color(c: Rgba) -> String {
    c.to_hex()
}

impl SvgWriter<'_> {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    /// Children in paint order; a mask child masks every later sibling.
    fn children(&mut self, ids: &[NodeId], body: &mut String) {
        for (i, id) in ids.iter().enumerate() {
            let Some(n) = self.host.node(*id) else {
                continue;
            };
            if n.is_mask && n.visible {
                let mask_id = self.mask_def(n);
                let _ = write!(body, r#"<g mask="url(#{mask_id})">"#);
                self.children(&ids[i + 1..], body);
                body.push_str("</g>");
                return;
            }
            self.node(n, body);
        }
    }

    fn mask_def(&mut self, n: &HostNode) -> String {
        let id = self.id("mask");
        let mut content = String::new();
        self.shape(n, &mut content);
        let _ = write!(
            self.defs,
            r#"<mask id="{id}" mask-type="alpha" maskUnits="userSpaceOnUse" x="-100000" y="-100000" width="200000" height="200000">{content}</mask>"#
        );
        id
    }

    /// Opacity, blend and filter attributes shared by every node wrapper.
    fn wrapper_attrs(&mut self, n: &HostNode) -> String {
        let mut attrs = String::new();
        if n.opacity < 1.0 {
            let _ = write!(attrs, r#" opacity="{}""#, n.opacity.clamp(0.0, 1.0));
        }
        if n.blend_mode != BlendMode::Normal {
            let _ = write!(attrs, r#" style="mix-blend-mode:{}""#, n.blend_mode.css_name());
        }
        if let Some(filter) = self.filter_def(&n.effects) {
            let _ = write!(attrs, r#" filter="url(#{filter})""#);
        }
        attrs
    }

    fn transform(n: &HostNode) -> String {
        if n.rotation != 0.0 {
            format!(r#" transform="translate({} {}) rotate({})""#, n.x, n.y, -n.rotation)
        } else {
            format!(r#" transform="translate({} {})""#, n.x, n.y)
        }
    }

    fn node(&mut self, n: &HostNode, body: &mut String) {
        if !n.visible {
            return;
        }
        let attrs = self.wrapper_attrs(n);
        match &n.kind {
            HostNodeKind::Group => {
                let _ = write!(body, "<g{attrs}>");
                self.children(&n.children, body);
                body.push_str("</g>");
            }
            HostNodeKind::Frame { clips_content } => {
                let _ = write!(body, "<g{}{attrs}>", Self::transform(n));
                let local = HostNode {
                    x: 0.0,
                    y: 0.0,
                    ..n.clone()
                };
                self.fills(&local, body);
                if *clips_content {
                    let clip = self.id("clip");
                    let _ = write!(
                        self.defs,
                        r#"<clipPath id="{clip}"><rect width="{}" height="{}"/></clipPath>"#,
                        n.width, n.height
                    );
                    let _ = write!(body, r#"<g clip-path="url(#{clip})">"#);
                    self.children(&n.children, body);
                    body.push_str("</g>");
                } else {
                    self.children(&n.children, body);
                }
                body.push_str("</g>");
            }
            HostNodeKind::Rectangle | HostNodeKind::Vector { .. } => {
                let _ = write!(body, "<g{attrs}>");
                self.shape(n, body);
                body.push_str("</g>");
            }
            HostNodeKind::Text { content } => {
                if let Some(content) = content {
                    let _ = write!(body, "<g{}{attrs}>", Self::transform(n));
                    self.text(n, content, body);
                    body.push_str("</g>");
                }
            }
        }
    }

    /// Geometry element for a shape in its own local space, with the given paint attributes.
    fn outline(n: &HostNode, paint: &str) -> String {
        match &n.kind {
            HostNodeKind::Vector { path, fill_rule } => {
                let rule = match fill_rule {
                    FillRule::Nonzero => "nonzero",
                    FillRule::Evenodd => "evenodd",
                };
                format!(r#"<path d="{}" fill-rule="{rule}" {paint}/>"#, path.to_svg())
            }
            _ => format!(r#"<rect width="{}" height="{}" {paint}/>"#, n.width, n.height),
        }
    }

    fn shape(&mut self, n: &HostNode, body: &mut String) {
        let _ = write!(body, "<g{}>", Self::transform(n));
        self.fills(n, body);
        if let Some(stroke) = &n.stroke {
            body.push_str(&Self::outline(n, &stroke_attrs(stroke)));
        }
        body.push_str("</g>");
    }

    fn fills(&mut self, n: &HostNode, body: &mut String) {
        for paint in &n.fills {
            match paint {
                Paint::Solid { color } => {
                    let attrs = format!(
                        r#"fill="{}" fill-opacity="{}""#,
                        fmt_color(*color),
                        color.a
                    );
                    body.push_str(&Self::outline(n, &attrs));
                }
                Paint::GradientLinear {
                    stops,
                    transform,
                    opacity,
                } => {
                    let id = self.id("grad");
                    let [[a, c, e], [b, d, f]] = *transform;
                    let inv = Affine::new([a, b, c, d, e, f]).inverse();
                    let [ia, ib, ic, id_, ie, if_] = inv.as_coeffs();
                    let mut def = format!(
                        r#"<linearGradient id="{id}" gradientUnits="objectBoundingBox" x1="0" y1="0.5" x2="1" y2="0.5" gradientTransform="matrix({ia} {ib} {ic} {id_} {ie} {if_})">"#
                    );
                    for s in stops {
                        let _ = write!(
                            def,
                            r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
                            s.position.clamp(0.0, 1.0),
                            fmt_color(s.color),
                            s.color.a
                        );
                    }
                    def.push_str("</linearGradient>");
                    self.defs.push_str(&def);
                    let attrs = format!(r#"fill="url(#{id})" fill-opacity="{opacity}""#);
                    body.push_str(&Self::outline(n, &attrs));
                }
                Paint::Image { hash } => {
                    let Some(img) = self.host.image(hash) else {
                        continue;
                    };
                    let uri = format!("data:image/png;base64,{}", STANDARD.encode(&img.png));
                    let image = format!(
                        r#"<image width="{}" height="{}" preserveAspectRatio="xMidYMid slice" xlink:href="{uri}"/>"#,
                        n.width, n.height
                    );
                    if matches!(n.kind, HostNodeKind::Vector { .. }) {
                        let clip = self.id("clip");
                        let outline = Self::outline(n, "");
                        let _ = write!(self.defs, r#"<clipPath id="{clip}">{outline}</clipPath>"#);
                        let _ = write!(body, r#"<g clip-path="url(#{clip})">{image}</g>"#);
                    } else {
                        body.push_str(&image);
                    }
                }
            }
        }
    }

    fn filter_def(&mut self, effects: &[NativeEffect]) -> Option<String> {
        let mut prims = String::new();
        for fx in effects {
            match fx {
                NativeEffect::LayerBlur { radius } if *radius > 0.0 => {
                    let _ = write!(prims, r#"<feGaussianBlur stdDeviation="{}"/>"#, radius / 2.0);
                }
                NativeEffect::DropShadow {
                    color,
                    offset,
                    radius,
                    ..
                } => {
                    let _ = write!(
                        prims,
                        r#"<feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-color="{}" flood-opacity="{}"/>"#,
                        offset.x,
                        offset.y,
                        (radius / 2.0).max(0.0),
                        fmt_color(*color),
                        color.a
                    );
                }
                NativeEffect::LayerBlur { .. } | NativeEffect::InnerShadow { .. } => {}
            }
        }
        if prims.is_empty() {
            return None;
        }
        let id = self.id("fx");
        let _ = write!(
            self.defs,
            r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%">{prims}</filter>"#
        );
        Some(id)
    }

    fn text(&mut self, n: &HostNode, t: &TextContent, body: &mut String) {
        let (weight, italic) = style_traits(&t.font.style);
        let (x, anchor) = match t.align {
            TextAlignH::Left | TextAlignH::Justified => (0.0, "start"),
            TextAlignH::Center => (n.width / 2.0, "middle"),
            TextAlignH::Right => (n.width, "end"),
        };
        let mut decorations = Vec::new();
        if t.underline {
            decorations.push("underline");
        }
        if t.strikethrough {
            decorations.push("line-through");
        }

        let _ = write!(
            body,
            r#"<text font-family="{}" font-size="{}" font-weight="{weight}" fill="{}" fill-opacity="{}" text-anchor="{anchor}" xml:space="preserve""#,
            esc(&t.font.family),
            t.font_size,
            fmt_color(t.color),
            t.color.a
        );
        if italic {
            body.push_str(r#" font-style="italic""#);
        }
        if let Some(pct) = t.letter_spacing {
            let _ = write!(body, r#" letter-spacing="{}""#, pct / 100.0 * t.font_size);
        }
        if !decorations.is_empty() {
            let _ = write!(body, r#" text-decoration="{}""#, decorations.join(" "));
        }
        body.push('>');

        let line_height = t
            .line_height
            .unwrap_or(t.font_size * DEFAULT_LINE_HEIGHT);
        for (i, line) in text_lines(t).into_iter().enumerate() {
            let dy = if i == 0 { t.font_size * ASCENT } else { line_height };
            let _ = write!(body, r#"<tspan x="{x}" dy="{dy}">"#);
            for seg in line {
                let mut attrs = String::new();
                if let Some(c) = seg.color {
                    let _ = write!(attrs, r#" fill="{}" fill-opacity="{}""#, fmt_color(c), c.a);
                }
                if let Some(size) = seg.font_size {
                    let _ = write!(attrs, r#" font-size="{size}""#);
                }
                if attrs.is_empty() {
                    body.push_str(&esc(&seg.text));
                } else {
                    let _ = write!(body, "<tspan{attrs}>{}</tspan>", esc(&seg.text));
                }
            }
            body.push_str("</tspan>");
        }
        body.push_str("</text>");
    }
}

fn stroke_attrs(s: &StrokeSpec) -> String {
    let mut attrs = format!(
        r#"fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
        fmt_color(s.color),
        s.color.a,
        s.weight
    );
    if !s.dash_pattern.is_empty() {
        let dashes: Vec<String> = s.dash_pattern.iter().map(|d| d.to_string()).collect();
        let _ = write!(attrs, r#" stroke-dasharray="{}""#, dashes.join(" "));
    }
    attrs
}

/// A run of text sharing one range override.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segment {
    pub text: String,
    pub color: Option<Rgba>,
    pub font_size: Option<f64>,
}

/// Lines of styled segments; range offsets are UTF-16 units and later ranges win.
pub(crate) fn text_lines(t: &TextContent) -> Vec<Vec<Segment>> {
    let mut lines: Vec<Vec<Segment>> = vec![Vec::new()];
    let mut offset = 0usize;
    for ch in t.characters.chars() {
        let units = ch.len_utf16();
        if ch == '\n' {
            lines.push(Vec::new());
            offset += units;
            continue;
        }
        let range = t
            .ranges
            .iter()
            .rev()
            .find(|r| r.start <= offset && offset < r.end);
        let (color, font_size) = range.map_or((None, None), |r| (r.color, r.font_size));
        offset += units;

        let Some(line) = lines.last_mut() else {
            continue;
        };
        match line.last_mut() {
            Some(seg) if seg.color == color && seg.font_size == font_size => seg.text.push(ch),
            _ => line.push(Segment {
                text: ch.to_string(),
                color,
                font_size,
            }),
        }
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
