use std::io::Cursor;

use anyhow::Context;

use crate::foundation::core::{BezPath, Point, Rect};
use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::model::FillRule;

/// Straight RGBA8 pixels of one decoded raster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

pub fn decode_image(bytes: &[u8]) -> SceneResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| SceneError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba8: rgba.into_raw(),
    })
}

pub fn encode_png(img: &DecodedImage) -> SceneResult<Vec<u8>> {
    let buf = image::RgbaImage::from_raw(img.width, img.height, img.rgba8.clone())
        .ok_or_else(|| SceneError::decode("pixel buffer does not match its dimensions"))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(buf)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Turn a grayscale luminance mask into an alpha mask: white pixels whose alpha is the
/// source luminance. Returned as PNG bytes.
pub fn luminance_to_alpha(bytes: &[u8]) -> SceneResult<Vec<u8>> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| SceneError::decode(format!("decode mask image: {e}")))?;
    let luma = dyn_img.to_luma8();
    let (width, height) = luma.dimensions();
    let mut rgba8 = Vec::with_capacity(luma.as_raw().len() * 4);
    for &l in luma.as_raw() {
        rgba8.extend_from_slice(&[255, 255, 255, l]);
    }
    encode_png(&DecodedImage {
        width,
        height,
        rgba8,
    })
}

/// Stroke attributes written into a path fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentStroke {
    pub hex: String,
    pub opacity: f64,
    pub width: f64,
}

/// Minimal SVG document wrapping a single `<path>`.
pub fn svg_fragment(
    path_data: &str,
    fill_rule: FillRule,
    fill: Option<(&str, f64)>,
    stroke: Option<&FragmentStroke>,
    width: f64,
    height: f64,
) -> String {
    let rule = match fill_rule {
        FillRule::Nonzero => "nonzero",
        FillRule::Evenodd => "evenodd",
    };
    let fill = match fill {
        Some((hex, opacity)) => format!(r#"fill="{hex}" fill-opacity="{opacity}""#),
        None => r#"fill="none""#.to_owned(),
    };
    let stroke = stroke.map_or_else(String::new, |s| {
        format!(
            r#" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
            s.hex, s.opacity, s.width
        )
    });
    let w = width.max(1.0);
    let h = height.max(1.0);
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><path d="{}" {fill} fill-rule="{rule}"{stroke}/></svg>"#,
        escape_attr(path_data)
    )
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

/// Geometry recovered from a parsed path fragment.
#[derive(Clone, Debug)]
pub struct ParsedVector {
    pub path: BezPath,
    pub fill_rule: FillRule,
    pub bounds: Rect,
}

/// Parse an SVG fragment and return the union of its path geometry in document space.
pub fn parse_path_fragment(svg: &str) -> SceneResult<ParsedVector> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| SceneError::path(format!("parse svg fragment: {e}")))?;

    let mut path = BezPath::new();
    let mut fill_rule = FillRule::Nonzero;
    collect_paths(tree.root(), &mut path, &mut fill_rule);
    if path.elements().is_empty() {
        return Err(SceneError::path("svg fragment contains no drawable path"));
    }
    let bounds = kurbo::Shape::bounding_box(&path);
    Ok(ParsedVector {
        path,
        fill_rule,
        bounds,
    })
}

fn collect_paths(group: &usvg::Group, out: &mut BezPath, fill_rule: &mut FillRule) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => collect_paths(g, out, fill_rule),
            usvg::Node::Path(p) => {
                if let Some(fill) = p.fill() {
                    *fill_rule = match fill.rule() {
                        usvg::FillRule::NonZero => FillRule::Nonzero,
                        usvg::FillRule::EvenOdd => FillRule::Evenodd,
                    };
                }
                let Some(data) = p.data().clone().transform(p.abs_transform()) else {
                    continue;
                };
                append_segments(&data, out);
            }
            usvg::Node::Image(_) | usvg::Node::Text(_) => {}
        }
    }
}

fn pt(p: resvg::tiny_skia::Point) -> Point {
    Point::new(f64::from(p.x), f64::from(p.y))
}

fn append_segments(data: &resvg::tiny_skia::Path, out: &mut BezPath) {
    use resvg::tiny_skia::PathSegment;

    for seg in data.segments() {
        match seg {
            PathSegment::MoveTo(p) => out.move_to(pt(p)),
            PathSegment::LineTo(p) => out.line_to(pt(p)),
            PathSegment::QuadTo(c, p) => out.quad_to(pt(c), pt(p)),
            PathSegment::CubicTo(c1, c2, p) => out.curve_to(pt(c1), pt(c2), pt(p)),
            PathSegment::Close => out.close_path(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
