use std::collections::HashMap;

use crate::foundation::color::Rgba8;
use crate::foundation::error::{KaruselError, KaruselResult};

/// Measurement seam between the layout solver and the font stack.
///
/// The production implementation is [`FontLibrary`] (Parley shaping); tests
/// substitute a deterministic fixed-advance implementation so the solver can
/// be exercised without font files.
pub trait TextMeasure {
    /// Advance width of `text` in pixels at the given family/weight/size.
    fn text_width(
        &mut self,
        text: &str,
        family: &str,
        bold: bool,
        size_px: f32,
    ) -> KaruselResult<f32>;
}

/// Font registry shared by measurement and glyph painting.
///
/// Families are registered from raw font bytes. Parley shapes against its own
/// copy while the paired `vello_cpu` font data is what the glyph rasterizer
/// consumes; keeping both avoids coupling the two crates' `peniko` versions.
pub struct FontLibrary {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    faces: HashMap<String, vello_cpu::peniko::FontData>,
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: HashMap::new(),
        }
    }

    /// Register a font face from raw bytes and return its family name.
    ///
    /// Re-registering the same family replaces the stored face.
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> KaruselResult<String> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            KaruselError::validation("no font families registered from font bytes")
        })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| KaruselError::validation("registered font family has no name"))?
            .to_string();

        let data =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        self.faces.insert(family_name.clone(), data);
        Ok(family_name)
    }

    /// Whether `family` has been registered.
    pub fn has_family(&self, family: &str) -> bool {
        self.faces.contains_key(family)
    }

    /// Confirm every referenced family is loaded before measuring or drawing.
    pub fn ensure_ready<'a>(&self, families: impl IntoIterator<Item = &'a str>) -> KaruselResult<()> {
        for family in families {
            if !self.has_family(family) {
                return Err(KaruselError::validation(format!(
                    "font family '{family}' is not registered"
                )));
            }
        }
        Ok(())
    }

    /// Rasterizer-side font data for a registered family.
    pub fn font_data(&self, family: &str) -> KaruselResult<&vello_cpu::peniko::FontData> {
        self.faces.get(family).ok_or_else(|| {
            KaruselError::validation(format!("font family '{family}' is not registered"))
        })
    }

    /// Shape one single-line styled run.
    pub fn layout_run(
        &mut self,
        text: &str,
        family: &str,
        bold: bool,
        size_px: f32,
        brush: Rgba8,
    ) -> KaruselResult<parley::Layout<Rgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(KaruselError::validation("font size must be finite and > 0"));
        }
        self.ensure_ready([family])?;

        let weight = if bold {
            parley::style::FontWeight::BLACK
        } else {
            parley::style::FontWeight::NORMAL
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family.to_string())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(weight));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl TextMeasure for FontLibrary {
    fn text_width(
        &mut self,
        text: &str,
        family: &str,
        bold: bool,
        size_px: f32,
    ) -> KaruselResult<f32> {
        let layout = self.layout_run(text, family, bold, size_px, Rgba8::default())?;
        Ok(layout.width())
    }
}
