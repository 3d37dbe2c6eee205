use serde::{Deserialize, Serialize};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Smallest width/height any emitted node may have.
pub const MIN_DIMENSION: f64 = 1.0;

/// Axis-aligned box in absolute document space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(self) -> Vec2 {
        Vec2::new(finite_or(self.x, 0.0), finite_or(self.y, 0.0))
    }

    /// True when either side is zero, negative or non-finite.
    pub fn is_empty(self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Same box re-expressed relative to `origin`.
    pub fn relative_to(self, origin: Vec2) -> Self {
        let o = self.origin() - origin;
        Self::new(o.x, o.y, self.width, self.height)
    }

    /// Width and height clamped to [`MIN_DIMENSION`].
    pub fn clamped_size(self) -> (f64, f64) {
        (clamp_dim(self.width), clamp_dim(self.height))
    }

    pub fn to_rect(self) -> Rect {
        let o = self.origin();
        let (w, h) = self.clamped_size();
        Rect::new(o.x, o.y, o.x + w, o.y + h)
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Xywh {
                x: f64,
                y: f64,
                width: f64,
                height: f64,
            },
            Edges {
                top: f64,
                left: f64,
                right: f64,
                bottom: f64,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Xywh {
                x,
                y,
                width,
                height,
            } => Self::new(x, y, width, height),
            Repr::Edges {
                top,
                left,
                right,
                bottom,
            } => Self::new(left, top, right - left, bottom - top),
        })
    }
}

/// Normalized color, every channel in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::gray(1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(v: f64) -> Self {
        Self::new(v, v, v, 1.0)
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(self) -> String {
        fn byte(v: f64) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

/// Clamp a node dimension to at least [`MIN_DIMENSION`]; non-finite becomes the minimum.
pub fn clamp_dim(v: f64) -> f64 {
    if v.is_finite() {
        v.max(MIN_DIMENSION)
    } else {
        MIN_DIMENSION
    }
}

pub fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Round to two decimals, the precision hosts accept for sizes and offsets.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
