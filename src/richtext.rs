use std::sync::LazyLock;

use regex::Regex;

use crate::foundation::color::Rgba8;

/// One styled run of paragraph text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub is_bold: bool,
    pub color: Option<Rgba8>,
}

impl TextSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bold: false,
            color: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_bold: true,
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Rgba8) -> Self {
        Self {
            text: text.into(),
            is_bold: false,
            color: Some(color),
        }
    }
}

// A marker must match both halves atomically; an unmatched `[...]` or a
// parenthesized non-color falls through as literal text.
static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*.*?\*\*|\[.*?\]\(#?[0-9a-fA-F]{3,8}\)").expect("marker pattern")
});

/// Decompose one paragraph into styled segments, scanned left-to-right in
/// source order.
///
/// Concatenating the segment texts reproduces the paragraph with the marker
/// delimiters stripped. A color whose digit count the marker accepts but the
/// parser cannot map (5 or 7 digits) yields a plain-colored segment with
/// `color: None`.
pub fn parse_segments(paragraph: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut last = 0usize;

    for m in MARKER.find_iter(paragraph) {
        if m.start() > last {
            segments.push(TextSegment::plain(&paragraph[last..m.start()]));
        }

        let part = m.as_str();
        if let Some(inner) = part.strip_prefix("**").and_then(|p| p.strip_suffix("**")) {
            segments.push(TextSegment::bold(inner));
        } else if let Some((label, color)) = split_color_marker(part) {
            segments.push(TextSegment {
                text: label.to_string(),
                is_bold: false,
                color: Rgba8::parse_hex(color).ok(),
            });
        }
        last = m.end();
    }

    if last < paragraph.len() {
        segments.push(TextSegment::plain(&paragraph[last..]));
    }

    segments
}

/// Split `[label](#color)` into `(label, color)`.
fn split_color_marker(part: &str) -> Option<(&str, &str)> {
    let body = part.strip_prefix('[')?.strip_suffix(')')?;
    let (label, color) = body.split_once("](")?;
    Some((label, color))
}
