use std::fmt::Write as _;

use crate::foundation::core::{Bounds, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::source::model::{Knot, SourceSubpath, SubpathShape};

/// Handles closer than this to their anchor count as absent.
const STRAIGHT_EPSILON: f64 = 0.01;

/// Cubic approximation constant for a quarter ellipse.
const KAPPA: f64 = 0.552_284_749_830_793_4;

fn fmt2(out: &mut String, v: Vec2) {
    let _ = write!(out, "{:.2} {:.2}", v.x, v.y);
}

fn is_straight(from: &Knot, to: &Knot) -> bool {
    let a = from.after() - from.anchor();
    let b = to.before() - to.anchor();
    a.x.abs() < STRAIGHT_EPSILON
        && a.y.abs() < STRAIGHT_EPSILON
        && b.x.abs() < STRAIGHT_EPSILON
        && b.y.abs() < STRAIGHT_EPSILON
}

fn segment(out: &mut String, from: &Knot, to: &Knot, origin: Vec2) {
    if is_straight(from, to) {
        out.push_str(" L ");
        fmt2(out, to.anchor() - origin);
    } else {
        out.push_str(" C ");
        fmt2(out, from.after() - origin);
        out.push(' ');
        fmt2(out, to.before() - origin);
        out.push(' ');
        fmt2(out, to.anchor() - origin);
    }
}

fn knots_finite(points: &[Knot]) -> bool {
    points.iter().all(|k| {
        k.anchor().is_finite() && k.before().is_finite() && k.after().is_finite()
    })
}

/// One sub-path from its knots, in coordinates relative to `origin`.
///
/// The first knot moves; every following knot is a line when both facing handles sit on
/// their anchors and a cubic otherwise. A path is closed unless it is explicitly open, and
/// only when it has more than two knots; the closing segment is a cubic back to the first
/// knot when the handles demand it.
fn knot_path(points: &[Knot], closed: bool, origin: Vec2) -> String {
    let mut out = String::new();
    let Some(first) = points.first() else {
        return out;
    };
    out.push_str("M ");
    fmt2(&mut out, first.anchor() - origin);
    for pair in points.windows(2) {
        segment(&mut out, &pair[0], &pair[1], origin);
    }
    if closed && points.len() > 2 {
        let last = &points[points.len() - 1];
        if is_straight(last, first) {
            out.push_str(" Z");
        } else {
            segment(&mut out, last, first, origin);
            out.push_str(" Z");
        }
    }
    out
}

fn rect_path(b: Bounds, radius: f64, origin: Vec2) -> String {
    let o = b.origin() - origin;
    let (w, h) = (b.width.max(0.0), b.height.max(0.0));
    let r = if radius.is_finite() {
        radius.clamp(0.0, w.min(h) / 2.0)
    } else {
        0.0
    };
    let mut out = String::new();
    if r <= 0.0 {
        let _ = write!(
            out,
            "M {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} L {:.2} {:.2} Z",
            o.x,
            o.y,
            o.x + w,
            o.y,
            o.x + w,
            o.y + h,
            o.x,
            o.y + h
        );
        return out;
    }
    let k = r * (1.0 - KAPPA);
    let (x0, y0, x1, y1) = (o.x, o.y, o.x + w, o.y + h);
    let _ = write!(
        out,
        "M {:.2} {:.2} L {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         L {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         L {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         L {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} Z",
        x0 + r, y0, x1 - r, y0, x1 - k, y0, x1, y0 + k, x1, y0 + r,
        x1, y1 - r, x1, y1 - k, x1 - k, y1, x1 - r, y1,
        x0 + r, y1, x0 + k, y1, x0, y1 - k, x0, y1 - r,
        x0, y0 + r, x0, y0 + k, x0 + k, y0, x0 + r, y0
    );
    out
}

fn ellipse_path(b: Bounds, origin: Vec2) -> String {
    let o = b.origin() - origin;
    let (rx, ry) = (b.width.max(0.0) / 2.0, b.height.max(0.0) / 2.0);
    let (cx, cy) = (o.x + rx, o.y + ry);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let mut out = String::new();
    let _ = write!(
        out,
        "M {:.2} {:.2} C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} \
         C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2} Z",
        cx + rx, cy,
        cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry,
        cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy,
        cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry,
        cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy
    );
    out
}

/// Render vector-mask sub-paths as SVG path data local to `layer_bounds`.
///
/// Returns `Ok(None)` when nothing drawable remains, and an error when a knot carries
/// non-finite coordinates.
pub fn subpaths_to_path_data(
    paths: &[SourceSubpath],
    layer_bounds: Bounds,
) -> SceneResult<Option<String>> {
    let origin = layer_bounds.origin();
    let mut parts = Vec::with_capacity(paths.len());
    for (i, p) in paths.iter().enumerate() {
        if !knots_finite(&p.points) {
            return Err(SceneError::path(format!("sub-path {i} has non-finite knots")));
        }
        let d = match (p.shape, p.points.is_empty(), p.bounds) {
            (_, false, _) => knot_path(&p.points, p.closed != Some(false), origin),
            (SubpathShape::Rect, true, Some(b)) => {
                rect_path(b, p.corner_radius.unwrap_or(0.0), origin)
            }
            (SubpathShape::Ellipse, true, Some(b)) => ellipse_path(b, origin),
            _ => continue,
        };
        if !d.is_empty() {
            parts.push(d);
        }
    }
    Ok(if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/path.rs"]
mod tests;
