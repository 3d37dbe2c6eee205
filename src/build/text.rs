use serde::{Deserialize, Serialize};

use crate::foundation::core::{Bounds, finite_or};
use crate::normalize::color::normalize_color;
use crate::scene::model::{StyleRange, TextAlignH, TextData, TextSizing};
use crate::source::model::{SourceStyleRun, SourceText, TextAlign};

/// Auto-wrap detection parameters.
///
/// A text box whose height holds more lines than its explicit line breaks explain is taken
/// to have wrapped in the source, and gets a fixed width with a little slack for font
/// substitution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapHeuristic {
    /// Extra estimated lines needed before wrapping is assumed.
    pub line_threshold: f64,
    /// Width slack, as a fraction of the source width.
    pub width_slack: f64,
}

impl Default for WrapHeuristic {
    fn default() -> Self {
        Self {
            line_threshold: 0.3,
            width_slack: 0.05,
        }
    }
}

/// Line height used when the source gives none.
const FALLBACK_LINE_HEIGHT: f64 = 16.0;

/// Sizing decision for a text box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    pub sizing: TextSizing,
    pub width: f64,
    pub height: f64,
}

impl WrapHeuristic {
    /// Decide how the host should size a text node laid out in `bounds`.
    pub fn decide(&self, characters: &str, text: &SourceText, bounds: Bounds) -> TextBox {
        let explicit_lines = characters.matches('\n').count() + 1;
        let line_height = [text.line_height, Some(text.font_size)]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(FALLBACK_LINE_HEIGHT);
        let height = finite_or(bounds.height, 0.0).max(0.0);
        let width = finite_or(bounds.width, 0.0).max(0.0);
        let estimated_lines = height / line_height;

        if estimated_lines > explicit_lines as f64 + self.line_threshold {
            return TextBox {
                sizing: TextSizing::Wrap,
                width: (width * (1.0 + self.width_slack)).ceil(),
                height,
            };
        }
        let sizing = if explicit_lines == 1 && text.align == TextAlign::Left {
            TextSizing::Auto
        } else {
            TextSizing::Fixed
        };
        TextBox {
            sizing,
            width,
            height,
        }
    }
}

/// Paragraph separators from the parser become `\n`.
pub fn normalize_characters(text: &str) -> String {
    text.replace("\r\n", "\n").replace(['\r', '\u{3}'], "\n")
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Style ranges from runs: each run covers the next `len(run.text)` characters, clamped
/// to the realized string. Runs that start past the end are dropped.
///
/// Offsets are UTF-16 code units, the unit hosts index text by.
pub fn style_ranges(runs: &[SourceStyleRun], characters: &str) -> Vec<StyleRange> {
    let total = utf16_len(characters);
    let mut out = Vec::with_capacity(runs.len());
    let mut pos = 0usize;
    for run in runs {
        let start = pos;
        let end = start + utf16_len(&normalize_characters(&run.text));
        pos = end;
        if start >= total || end == start {
            continue;
        }
        out.push(StyleRange {
            start,
            end: end.min(total),
            font_family: run.font_family.clone().filter(|f| !f.is_empty()),
            font_style: run.font_style.clone().filter(|f| !f.is_empty()),
            font_size: run.font_size.filter(|s| s.is_finite() && *s > 0.0),
            color: run.color.map(normalize_color),
            letter_spacing: run.letter_spacing.filter(|v| v.is_finite()),
            underline: run.underline,
            strikethrough: run.strikethrough,
        });
    }
    out
}

pub fn align_h(a: TextAlign) -> TextAlignH {
    match a {
        TextAlign::Left => TextAlignH::Left,
        TextAlign::Center => TextAlignH::Center,
        TextAlign::Right => TextAlignH::Right,
        TextAlign::Justify => TextAlignH::Justified,
    }
}

/// Text payload plus the box the node should occupy.
pub fn build_text(text: &SourceText, bounds: Bounds, wrap: &WrapHeuristic) -> (TextData, TextBox) {
    let characters = normalize_characters(&text.text);
    let text_box = wrap.decide(&characters, text, bounds);
    let rotation = text
        .transform
        .as_ref()
        .map(|t| t.rotation_degrees())
        .filter(|r| *r != 0.0);
    let data = TextData {
        style_ranges: style_ranges(&text.runs, &characters),
        characters,
        font_family: text.font_family.clone(),
        font_style: text.font_style.clone().filter(|s| !s.is_empty()),
        font_size: finite_or(text.font_size, 0.0).max(0.0),
        color: normalize_color(text.color),
        line_height: text.line_height.filter(|v| v.is_finite() && *v > 0.0),
        letter_spacing: text.letter_spacing.filter(|v| v.is_finite() && *v != 0.0),
        text_align: align_h(text.align),
        underline: text.underline,
        strikethrough: text.strikethrough,
        sizing: text_box.sizing,
        rotation,
    };
    (data, text_box)
}

#[cfg(test)]
#[path = "../../tests/unit/build/text.rs"]
mod tests;
