use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::color::Rgba8;
use crate::foundation::error::{KaruselError, KaruselResult};

/// Hard cap on content slides per carousel (before the bonus slide is appended).
pub const MAX_SLIDES: usize = 20;

/// Unscaled starting font size for the shrink-to-fit search, in pixels.
pub const BASE_FONT_SIZE: f32 = 64.0;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// One unit of carousel content, rendered to exactly one output image.
///
/// Slides are immutable once created; a text edit regenerates the whole
/// sequence via [`crate::split::assemble_slides`].
pub struct Slide {
    /// Stable id, unique within one carousel (1-based position, or
    /// [`Slide::BONUS_ID`] for the synthetic final slide).
    pub id: u32,
    /// Raw slide text, inline markup included.
    pub text: String,
    /// Whether this is the synthetic bonus/call-to-action slide.
    #[serde(default)]
    pub is_special_final: bool,
}

impl Slide {
    /// Sentinel id of the synthetic bonus slide.
    pub const BONUS_ID: u32 = 999;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Strategy used to divide raw input text into slides.
pub enum SplitMethod {
    /// Split on one-or-more blank lines.
    #[default]
    EmptyLine,
    /// Split on literal `---` separators.
    SeparatorLine,
    /// Split on a localized "Слайд N:" label (case-insensitive).
    #[serde(rename = "slide-number")]
    SlideNumberLabel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Output raster format. Each format fixes pixel size, minimum font size and
/// text padding.
pub enum CarouselFormat {
    #[serde(rename = "1080x1080")]
    Square1080,
    #[default]
    #[serde(rename = "1080x1350")]
    Portrait1080x1350,
}

/// Fixed per-format canvas constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormatSpec {
    pub width: u32,
    pub height: u32,
    pub min_font_size: f32,
    pub padding: f32,
}

impl CarouselFormat {
    pub fn spec(self) -> FormatSpec {
        match self {
            CarouselFormat::Square1080 => FormatSpec {
                width: 1080,
                height: 1080,
                min_font_size: 30.0,
                padding: 80.0,
            },
            CarouselFormat::Portrait1080x1350 => FormatSpec {
                width: 1080,
                height: 1350,
                min_font_size: 36.0,
                padding: 100.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Content type; affects header detection and forced left alignment.
pub enum CarouselType {
    #[default]
    Standard,
    DailyPlan,
    Bullets,
    List,
}

impl CarouselType {
    /// List-like content is always painted left-aligned on non-cover slides.
    pub fn forces_left_align(self) -> bool {
        matches!(
            self,
            CarouselType::DailyPlan | CarouselType::Bullets | CarouselType::List
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Horizontal text alignment. `Justify` is accepted configuration but paints
/// identically to `Left`; the painter has no distinct justification pass.
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Justify,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Anchor position for the nickname/avatar branding overlay.
pub enum BrandAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
}

impl BrandAnchor {
    pub fn is_top(self) -> bool {
        matches!(
            self,
            BrandAnchor::TopLeft | BrandAnchor::TopCenter | BrandAnchor::TopRight
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Anchor position for the `N/total` slide counter.
pub enum CounterAnchor {
    TopRight,
    #[default]
    BottomRight,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
/// Background drawing strategy, a closed set of template variants.
pub enum TemplateStyle {
    /// Solid background color.
    Flat { bg: Rgba8 },
    /// Vertical two-stop gradient.
    Gradient { top: Rgba8, bottom: Rgba8 },
    /// Caller-supplied photo, cover-fit and darkened for legibility.
    /// `fallback` is used when no image is supplied or decoding fails.
    Image { fallback: Rgba8 },
    /// Rounded card inset with a drop shadow; shrinks the effective text
    /// padding by the card margin.
    CardInset { bg: Rgba8, card: Rgba8 },
    /// Flat background with faint horizontal rule lines.
    RuledPaper { bg: Rgba8, rule: Rgba8 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// A design template: background strategy plus default text color.
pub struct Template {
    pub id: String,
    pub name: String,
    pub style: TemplateStyle,
    pub text_color: Rgba8,
}

fn flat(id: &str, name: &str, bg: &str, text: &str) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        style: TemplateStyle::Flat {
            bg: Rgba8::parse_hex(bg).unwrap_or_default(),
        },
        text_color: Rgba8::parse_hex(text).unwrap_or_default(),
    }
}

/// The built-in template presets, in UI order.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        flat("black", "Черный", "#121212", "#ffffff"),
        flat("white", "Белый", "#ffffff", "#1a1a1a"),
        flat("red", "Темно-красный", "#660810", "#f1ebeb"),
        flat("green", "Темно-зеленый", "#465940", "#fdfbf0"),
        flat("navy", "Глубокий синий", "#102e4a", "#fff7e6"),
        flat("blue", "Королевский", "#001166", "#f0f0e7"),
        Template {
            id: "dusk".to_string(),
            name: "Сумерки".to_string(),
            style: TemplateStyle::Gradient {
                top: Rgba8::rgb(0x1a, 0x1a, 0x2e),
                bottom: Rgba8::rgb(0x16, 0x21, 0x3e),
            },
            text_color: Rgba8::rgb(0xf5, 0xf5, 0xf5),
        },
        Template {
            id: "card".to_string(),
            name: "Карточка".to_string(),
            style: TemplateStyle::CardInset {
                bg: Rgba8::rgb(0xe8, 0xe4, 0xda),
                card: Rgba8::rgb(0xfd, 0xfb, 0xf5),
            },
            text_color: Rgba8::rgb(0x1a, 0x1a, 0x1a),
        },
        Template {
            id: "paper".to_string(),
            name: "Тетрадь".to_string(),
            style: TemplateStyle::RuledPaper {
                bg: Rgba8::rgb(0xfb, 0xf8, 0xf1),
                rule: Rgba8::rgb(0x22, 0x22, 0x3b),
            },
            text_color: Rgba8::rgb(0x22, 0x22, 0x3b),
        },
        Template {
            id: "custom-color".to_string(),
            name: "Свой цвет".to_string(),
            style: TemplateStyle::Flat {
                bg: Rgba8::rgb(0x73, 0x73, 0x73),
            },
            text_color: Rgba8::rgb(255, 255, 255),
        },
        Template {
            id: "custom-image".to_string(),
            name: "Свое фото".to_string(),
            style: TemplateStyle::Image {
                fallback: Rgba8::rgb(0, 0, 0),
            },
            text_color: Rgba8::rgb(255, 255, 255),
        },
    ]
}

/// Look up a built-in template by id.
///
/// An unknown id is a contract violation on the caller's side, not a per-slide
/// render failure.
pub fn template_by_id(id: &str) -> KaruselResult<Template> {
    builtin_templates()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| KaruselError::validation(format!("unknown template id '{id}'")))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Header/body font family pair. Families must be registered with the
/// [`crate::fonts::FontLibrary`] before rendering.
pub struct FontPair {
    pub id: String,
    pub name: String,
    pub header_family: String,
    pub body_family: String,
}

impl Default for FontPair {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default".to_string(),
            header_family: "Montserrat".to_string(),
            body_family: "Manrope".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Per-slide font-size/line-height scaling override.
pub struct SlideOverride {
    /// Multiplier on the base font size, clamped to `0.5..=2.5`.
    pub font_size_scale: f32,
    /// Multiplier on line height, clamped to `1.0..=2.0`.
    pub line_height_scale: f32,
    /// Per-slide alignment override; falls back to the global setting.
    pub text_align: Option<TextAlign>,
}

impl Default for SlideOverride {
    fn default() -> Self {
        Self {
            font_size_scale: 1.0,
            line_height_scale: 1.35,
            text_align: None,
        }
    }
}

impl SlideOverride {
    /// Clamp scales into their supported ranges.
    pub fn clamped(self) -> Self {
        Self {
            font_size_scale: self.font_size_scale.clamp(0.5, 2.5),
            line_height_scale: self.line_height_scale.clamp(1.0, 2.0),
            text_align: self.text_align,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Configuration of the optional bonus/call-to-action final slide.
pub struct FinalSlideConfig {
    pub enabled: bool,
    pub text_before: String,
    pub code_word: String,
    pub text_after: String,
    pub blog_topic: String,
    /// Vertical placement of the text block, `0..=100`.
    pub vertical_offset: u8,
    /// Vertical placement of the branding row, `0..=100`.
    pub branding_offset: u8,
    pub design_variant: u8,
}

impl Default for FinalSlideConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            text_before: "Пиши в комментариях".to_string(),
            code_word: "СЛОВО".to_string(),
            text_after: "и я отправлю тебе бонус в директ!".to_string(),
            blog_topic: String::new(),
            vertical_offset: 50,
            branding_offset: 50,
            design_variant: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
/// Immutable per-render snapshot of every knob the pipeline consumes.
///
/// A config is pure data: image bytes (avatar, custom background) travel
/// separately as [`crate::assets::SlideAssets`] so that the draw pass only
/// ever sees already-decoded bitmaps.
pub struct RenderConfig {
    pub format: CarouselFormat,
    pub carousel_type: CarouselType,
    pub template_id: String,
    /// Background override, honored by the `custom-color` template only.
    pub custom_bg_color: Option<Rgba8>,
    /// Text color override, honored by the `custom-color` template only.
    pub custom_text_color: Option<Rgba8>,
    pub font_pair: FontPair,
    pub nickname: String,
    pub brand_anchor: BrandAnchor,
    pub show_slide_count: bool,
    pub counter_anchor: CounterAnchor,
    pub text_align: TextAlign,
    /// Per-slide overrides keyed by slide id.
    pub overrides: BTreeMap<u32, SlideOverride>,
    pub final_slide: FinalSlideConfig,
}

impl RenderConfig {
    /// Resolve the override for a slide, clamped, with the standard defaults
    /// when none is set.
    pub fn override_for(&self, slide_id: u32) -> SlideOverride {
        self.overrides
            .get(&slide_id)
            .copied()
            .unwrap_or_default()
            .clamped()
    }

    /// Resolve the template, applying custom color overrides where the
    /// template supports them.
    pub fn template(&self) -> KaruselResult<Template> {
        let id = if self.template_id.is_empty() {
            "black"
        } else {
            self.template_id.as_str()
        };
        let mut template = template_by_id(id)?;
        if template.id == "custom-color" {
            if let Some(bg) = self.custom_bg_color {
                template.style = TemplateStyle::Flat { bg };
            }
            if let Some(text) = self.custom_text_color {
                template.text_color = text;
            }
        }
        Ok(template)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Per-slide outcome of the shrink-to-fit validation.
pub struct ValidationResult {
    pub slide_id: u32,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_used: Option<f32>,
}

impl ValidationResult {
    pub fn ok(slide_id: u32, font_size_used: f32) -> Self {
        Self {
            slide_id,
            is_valid: true,
            error: None,
            font_size_used: Some(font_size_used),
        }
    }

    pub fn failed(slide_id: u32, error: impl Into<String>) -> Self {
        Self {
            slide_id,
            is_valid: false,
            error: Some(error.into()),
            font_size_used: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_specs_match_published_constants() {
        let sq = CarouselFormat::Square1080.spec();
        assert_eq!((sq.width, sq.height), (1080, 1080));
        assert_eq!(sq.min_font_size, 30.0);
        assert_eq!(sq.padding, 80.0);

        let pt = CarouselFormat::Portrait1080x1350.spec();
        assert_eq!((pt.width, pt.height), (1080, 1350));
        assert_eq!(pt.min_font_size, 36.0);
        assert_eq!(pt.padding, 100.0);
    }

    #[test]
    fn unknown_template_is_a_contract_violation() {
        let err = template_by_id("does-not-exist").unwrap_err();
        assert!(err.to_string().contains("unknown template id"));
    }

    #[test]
    fn custom_color_template_honors_overrides() {
        let cfg = RenderConfig {
            template_id: "custom-color".to_string(),
            custom_bg_color: Some(Rgba8::rgb(1, 2, 3)),
            custom_text_color: Some(Rgba8::rgb(4, 5, 6)),
            ..RenderConfig::default()
        };
        let t = cfg.template().unwrap();
        assert_eq!(t.style, TemplateStyle::Flat { bg: Rgba8::rgb(1, 2, 3) });
        assert_eq!(t.text_color, Rgba8::rgb(4, 5, 6));

        // Overrides are ignored by fixed templates.
        let cfg = RenderConfig {
            template_id: "white".to_string(),
            custom_bg_color: Some(Rgba8::rgb(1, 2, 3)),
            ..RenderConfig::default()
        };
        let t = cfg.template().unwrap();
        assert_eq!(
            t.style,
            TemplateStyle::Flat { bg: Rgba8::rgb(0xff, 0xff, 0xff) }
        );
    }

    #[test]
    fn override_resolution_clamps_scales() {
        let mut cfg = RenderConfig::default();
        cfg.overrides.insert(
            7,
            SlideOverride {
                font_size_scale: 9.0,
                line_height_scale: 0.2,
                text_align: Some(TextAlign::Center),
            },
        );

        let o = cfg.override_for(7);
        assert_eq!(o.font_size_scale, 2.5);
        assert_eq!(o.line_height_scale, 1.0);
        assert_eq!(o.text_align, Some(TextAlign::Center));

        let d = cfg.override_for(8);
        assert_eq!(d.font_size_scale, 1.0);
        assert_eq!(d.line_height_scale, 1.35);
    }

    #[test]
    fn split_method_serde_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_value(SplitMethod::SlideNumberLabel).unwrap(),
            serde_json::json!("slide-number")
        );
        let m: SplitMethod = serde_json::from_value(serde_json::json!("empty-line")).unwrap();
        assert_eq!(m, SplitMethod::EmptyLine);
    }
}
