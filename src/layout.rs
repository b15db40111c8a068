use crate::config::{CarouselType, FontPair};
use crate::fonts::TextMeasure;
use crate::foundation::error::KaruselResult;
use crate::richtext::{TextSegment, parse_segments};

/// Linear shrink step of the fit search, in pixels.
pub const FONT_SHRINK_STEP: f32 = 2.0;

/// Character threshold below which a first paragraph qualifies as a header.
/// A heuristic cutoff, not a sacred number.
pub const HEADER_MAX_CHARS: usize = 80;

/// Inter-paragraph spacing as a fraction of the paragraph's font size.
pub const PARAGRAPH_SPACING: f32 = 0.3;

/// Inputs of one layout solve. All sizes are pixels.
#[derive(Clone, Copy, Debug)]
pub struct LayoutParams {
    pub start_font_size: f32,
    pub min_font_size: f32,
    pub max_width: f32,
    pub max_height: f32,
    pub line_height_scale: f32,
    /// Multiplier applied to header lines (1.6 on covers, 1.1 elsewhere).
    pub header_scale: f32,
    /// Multiplier applied to body lines (1.0 on covers, 0.75 elsewhere).
    pub body_scale: f32,
    pub is_cover: bool,
    pub is_last: bool,
    pub carousel_type: CarouselType,
    pub header_max_chars: usize,
}

impl LayoutParams {
    /// Standard parameters for a content slide at position `index` of `total`.
    pub fn for_slide(
        index: usize,
        total: usize,
        carousel_type: CarouselType,
        start_font_size: f32,
        min_font_size: f32,
        max_width: f32,
        max_height: f32,
        line_height_scale: f32,
    ) -> Self {
        let is_cover = index == 0;
        let (header_scale, body_scale) = if is_cover { (1.6, 1.0) } else { (1.1, 0.75) };
        Self {
            start_font_size,
            min_font_size,
            max_width,
            max_height,
            line_height_scale,
            header_scale,
            body_scale,
            is_cover,
            is_last: index + 1 == total,
            carousel_type,
            header_max_chars: HEADER_MAX_CHARS,
        }
    }
}

/// One wrapped output line. Segment texts carry their trailing space so that
/// painting left-to-right needs no extra spacing logic.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutLine {
    pub segments: Vec<TextSegment>,
    pub is_header: bool,
    pub width: f32,
    pub font_size_px: f32,
    /// Extra vertical space after this line beyond its own line height
    /// (paragraph spacing lands here so the painter can replay the solver's
    /// height accounting exactly).
    pub gap_after: f32,
}

/// Result of the shrink-to-fit search.
#[derive(Clone, Debug)]
pub struct SolvedLayout {
    pub lines: Vec<LayoutLine>,
    pub total_height: f32,
    pub font_size_used: f32,
    /// False when even `min_font_size` cannot satisfy the height budget; the
    /// layout is then a best effort at the floor size.
    pub is_valid: bool,
}

/// Header heuristic: only a slide's first paragraph ever qualifies, under
/// content-type-specific rules.
fn is_header_paragraph(p_idx: usize, paragraph: &str, params: &LayoutParams) -> bool {
    if p_idx != 0 {
        return false;
    }
    let short = paragraph.chars().count() < params.header_max_chars;
    if params.is_cover {
        short
    } else if params.carousel_type == CarouselType::Bullets && !params.is_last {
        true
    } else {
        short && params.carousel_type == CarouselType::Standard
    }
}

/// Wrap the whole slide text at one candidate base size.
///
/// Returns the wrapped lines plus the total height they occupy.
fn wrap_at_size(
    text: &str,
    base_size: f32,
    params: &LayoutParams,
    fonts: &FontPair,
    measure: &mut dyn TextMeasure,
) -> KaruselResult<(Vec<LayoutLine>, f32)> {
    let paragraphs: Vec<&str> = text.split('\n').collect();
    let mut lines = Vec::new();
    let mut total_height = 0.0f32;

    for (p_idx, paragraph) in paragraphs.iter().enumerate() {
        let is_header = is_header_paragraph(p_idx, paragraph, params);
        let scale = if is_header { params.header_scale } else { params.body_scale };
        let font_size = base_size * scale;
        let family = if is_header { &fonts.header_family } else { &fonts.body_family };

        let mut current: Vec<TextSegment> = Vec::new();
        let mut current_width = 0.0f32;

        for seg in parse_segments(paragraph) {
            let words: Vec<&str> = seg.text.split(' ').collect();
            for (w_idx, word) in words.iter().enumerate() {
                let is_last_word = w_idx + 1 == words.len();
                let word_text = if is_last_word {
                    (*word).to_string()
                } else {
                    format!("{word} ")
                };
                let bold = seg.is_bold || is_header;
                let word_width = measure.text_width(&word_text, family, bold, font_size)?;

                if current_width + word_width > params.max_width && !current.is_empty() {
                    lines.push(LayoutLine {
                        segments: std::mem::take(&mut current),
                        is_header,
                        width: current_width,
                        font_size_px: font_size,
                        gap_after: 0.0,
                    });
                    total_height += font_size * params.line_height_scale;
                    current_width = 0.0;
                }
                current.push(TextSegment {
                    text: word_text,
                    is_bold: seg.is_bold,
                    color: seg.color,
                });
                current_width += word_width;
            }
        }

        if !current.is_empty() {
            lines.push(LayoutLine {
                segments: current,
                is_header,
                width: current_width,
                font_size_px: font_size,
                gap_after: 0.0,
            });
            total_height += font_size * params.line_height_scale;
        }
        if p_idx + 1 < paragraphs.len() {
            total_height += font_size * PARAGRAPH_SPACING;
            if let Some(last) = lines.last_mut() {
                last.gap_after += font_size * PARAGRAPH_SPACING;
            }
        }
    }

    Ok((lines, total_height))
}

/// Shrink-to-fit search: linear descent from the starting size, since a larger
/// size never produces a smaller wrapped height.
pub fn solve_layout(
    text: &str,
    params: &LayoutParams,
    fonts: &FontPair,
    measure: &mut dyn TextMeasure,
) -> KaruselResult<SolvedLayout> {
    let mut size = params.start_font_size.max(params.min_font_size);

    while size >= params.min_font_size {
        let (lines, total_height) = wrap_at_size(text, size, params, fonts, measure)?;
        if total_height <= params.max_height {
            tracing::debug!(font_size = size, lines = lines.len(), "layout fit");
            return Ok(SolvedLayout {
                lines,
                total_height,
                font_size_used: size,
                is_valid: true,
            });
        }
        size -= FONT_SHRINK_STEP;
    }

    // Nothing fit; render a best effort at the floor size and report failure.
    let (lines, total_height) =
        wrap_at_size(text, params.min_font_size, params, fonts, measure)?;
    tracing::debug!(
        font_size = params.min_font_size,
        total_height,
        max_height = params.max_height,
        "layout does not fit at minimum font size"
    );
    Ok(SolvedLayout {
        lines,
        total_height,
        font_size_used: params.min_font_size,
        is_valid: false,
    })
}

/// Wrap plain unstyled text at a fixed size; used by the bonus-slide branch.
pub fn wrap_plain(
    text: &str,
    family: &str,
    bold: bool,
    size_px: f32,
    max_width: f32,
    measure: &mut dyn TextMeasure,
) -> KaruselResult<Vec<String>> {
    let mut words = text.split(' ');
    let Some(first) = words.next() else {
        return Ok(Vec::new());
    };

    let mut lines = Vec::new();
    let mut current = first.to_string();
    for word in words {
        let candidate = format!("{current} {word}");
        let width = measure.text_width(&candidate, family, bold, size_px)?;
        if width < max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);
    Ok(lines)
}
