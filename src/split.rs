use std::sync::LazyLock;

use regex::Regex;

use crate::config::{FinalSlideConfig, MAX_SLIDES, Slide, SplitMethod};

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("blank-line pattern"));

static SLIDE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Слайд\s*\d+\s*:").expect("slide-label pattern"));

/// Divide raw input text into an ordered slide sequence.
///
/// The input is trimmed first; empty input yields an empty sequence. Every
/// non-empty trimmed chunk becomes one slide with a contiguous 1-based id.
pub fn split_slides(text: &str, method: SplitMethod) -> Vec<Slide> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chunks: Vec<&str> = match method {
        SplitMethod::EmptyLine => BLANK_LINE.split(trimmed).collect(),
        SplitMethod::SeparatorLine => trimmed.split("---").collect(),
        SplitMethod::SlideNumberLabel => {
            let mut parts: Vec<&str> = SLIDE_LABEL.split(trimmed).collect();
            // Text before the first label is noise, not a leading slide.
            if parts.first().is_some_and(|p| p.trim().is_empty()) {
                parts.remove(0);
            }
            parts
        }
    };

    chunks
        .into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .enumerate()
        .map(|(i, text)| Slide {
            id: (i + 1) as u32,
            text: text.to_string(),
            is_special_final: false,
        })
        .collect()
}

/// Split, apply the [`MAX_SLIDES`] cap, and append the synthetic bonus slide
/// when enabled. The bonus slide is always last and carries [`Slide::BONUS_ID`].
pub fn assemble_slides(
    text: &str,
    method: SplitMethod,
    final_slide: Option<&FinalSlideConfig>,
) -> Vec<Slide> {
    let mut slides = split_slides(text, method);
    slides.truncate(MAX_SLIDES);
    if final_slide.is_some_and(|f| f.enabled) {
        slides.push(Slide {
            id: Slide::BONUS_ID,
            text: String::new(),
            is_special_final: true,
        });
    }
    slides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_slides() {
        assert!(split_slides("", SplitMethod::EmptyLine).is_empty());
        assert!(split_slides("  \n\t \n", SplitMethod::EmptyLine).is_empty());
    }

    #[test]
    fn empty_line_split_handles_whitespace_only_gaps() {
        let slides = split_slides("one\n\ntwo\n   \nthree", SplitMethod::EmptyLine);
        let texts: Vec<&str> = slides.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        let ids: Vec<u32> = slides.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn separator_split_drops_empty_chunks() {
        let slides = split_slides("a---b------c", SplitMethod::SeparatorLine);
        let texts: Vec<&str> = slides.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn slide_label_split_discards_leading_noise() {
        let slides = split_slides("Слайд 1: Hello\nСлайд 2: World", SplitMethod::SlideNumberLabel);
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].text, "Hello");
        assert_eq!(slides[1].text, "World");
        assert_eq!(slides[0].id, 1);
    }

    #[test]
    fn slide_label_split_is_case_insensitive_and_keeps_preamble() {
        let slides = split_slides("intro\nслайд 1: a\nСЛАЙД  2  : b", SplitMethod::SlideNumberLabel);
        let texts: Vec<&str> = slides.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["intro", "a", "b"]);
    }

    #[test]
    fn no_slide_is_ever_empty_and_ids_are_contiguous() {
        let inputs = [
            "\n\n\n",
            "a\n\n\n\nb",
            "---a---",
            "Слайд 1:  \nСлайд 2: x",
        ];
        for text in inputs {
            for method in [
                SplitMethod::EmptyLine,
                SplitMethod::SeparatorLine,
                SplitMethod::SlideNumberLabel,
            ] {
                let slides = split_slides(text, method);
                for (i, s) in slides.iter().enumerate() {
                    assert!(!s.text.trim().is_empty(), "{text:?} {method:?}");
                    assert_eq!(s.id, (i + 1) as u32, "{text:?} {method:?}");
                }
            }
        }
    }

    #[test]
    fn scenario_title_then_markup_paragraph() {
        let slides = split_slides(
            "Title\n\n**Bold** and [red](#ff0000) text",
            SplitMethod::EmptyLine,
        );
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].text, "Title");
        assert_eq!(slides[1].text, "**Bold** and [red](#ff0000) text");
    }

    #[test]
    fn assemble_caps_then_appends_bonus_last() {
        let text = (0..30).map(|i| format!("s{i}")).collect::<Vec<_>>().join("\n\n");
        let bonus = FinalSlideConfig {
            enabled: true,
            ..FinalSlideConfig::default()
        };

        let slides = assemble_slides(&text, SplitMethod::EmptyLine, Some(&bonus));
        assert_eq!(slides.len(), MAX_SLIDES + 1);
        let last = slides.last().unwrap();
        assert!(last.is_special_final);
        assert_eq!(last.id, Slide::BONUS_ID);
        assert!(slides[..MAX_SLIDES].iter().all(|s| !s.is_special_final));

        let disabled = FinalSlideConfig::default();
        let slides = assemble_slides("a\n\nb", SplitMethod::EmptyLine, Some(&disabled));
        assert_eq!(slides.len(), 2);
        assert!(slides.iter().all(|s| !s.is_special_final));
    }
}
