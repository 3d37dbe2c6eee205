use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba;

/// Color as the parser hands it over: channels may be `0..=1` or `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl RawColor {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }
}

impl Default for RawColor {
    fn default() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl From<Rgba> for RawColor {
    fn from(c: Rgba) -> Self {
        Self::rgba(c.r, c.g, c.b, c.a)
    }
}

impl<'de> Deserialize<'de> for RawColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

/// Hex colors land in the 0..255 range; alpha is normalized.
fn parse_hex(s: &str) -> Result<RawColor, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<f64, String> {
        u8::from_str_radix(pair, 16)
            .map(f64::from)
            .map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }
    match s.len() {
        6 => Ok(RawColor::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(RawColor::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])? / 255.0,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

/// Normalize a parser color into `0..=1`.
///
/// Each channel above 1 is taken to be on the 0..255 scale. Values already in `0..=1`
/// pass through, so the function is idempotent on normalized input. Alpha defaults to 1
/// upstream and is only clamped here; non-finite channels collapse to 0.
pub fn normalize_color(raw: RawColor) -> Rgba {
    fn channel(v: f64) -> f64 {
        if !v.is_finite() {
            return 0.0;
        }
        let v = if v > 1.0 { v / 255.0 } else { v };
        v.clamp(0.0, 1.0)
    }

    let a = if raw.a.is_finite() {
        raw.a.clamp(0.0, 1.0)
    } else {
        1.0
    };
    Rgba::new(channel(raw.r), channel(raw.g), channel(raw.b), a)
}

/// Opacity as either a fraction or a percentage; anything unusable becomes fully opaque.
pub fn normalize_opacity(v: f64) -> f64 {
    if !v.is_finite() {
        return 1.0;
    }
    let v = if v > 1.0 { v / 100.0 } else { v };
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/color.rs"]
mod tests;
