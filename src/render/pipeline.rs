use crate::assets::SlideAssets;
use crate::config::{RenderConfig, Slide, ValidationResult};
use crate::fonts::FontLibrary;
use crate::foundation::error::KaruselResult;
use crate::render::compositor::{RenderedImage, SlideCompositor};

/// One finished batch. `images[i]` is `None` when slide `i` failed to render;
/// its `validations[i]` entry says why.
#[derive(Debug)]
pub struct CarouselOutput {
    /// Monotonic batch counter; consumers drop outputs whose generation is
    /// older than the latest one they have seen.
    pub generation: u64,
    pub images: Vec<Option<RenderedImage>>,
    pub validations: Vec<ValidationResult>,
}

impl CarouselOutput {
    /// Stable export filename for slide `index`, 1-based for humans.
    pub fn entry_name(index: usize) -> String {
        format!("carousel_{}.png", index + 1)
    }

    pub fn all_valid(&self) -> bool {
        self.validations.iter().all(|v| v.is_valid)
    }
}

/// Renders whole carousels, one slide at a time, against a shared font
/// library.
pub struct CarouselRenderer {
    fonts: FontLibrary,
    compositor: SlideCompositor,
    generation: u64,
}

impl Default for CarouselRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl CarouselRenderer {
    pub fn new() -> Self {
        Self {
            fonts: FontLibrary::new(),
            compositor: SlideCompositor::new(),
            generation: 0,
        }
    }

    /// Register a font face; see [`FontLibrary::register_font`].
    pub fn register_font(&mut self, font_bytes: Vec<u8>) -> KaruselResult<String> {
        self.fonts.register_font(font_bytes)
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Render every slide of one carousel, in order.
    ///
    /// The batch never aborts: a failing slide yields a `None` image and a
    /// failed validation entry while the remaining slides still render.
    pub fn render_all(
        &mut self,
        slides: &[Slide],
        config: &RenderConfig,
        assets: &SlideAssets,
    ) -> CarouselOutput {
        self.generation += 1;
        let generation = self.generation;
        tracing::info!(generation, slides = slides.len(), "rendering carousel");

        let total = slides.len();
        let mut images = Vec::with_capacity(total);
        let mut validations = Vec::with_capacity(total);

        for (index, slide) in slides.iter().enumerate() {
            let (image, validation) =
                self.compositor
                    .render_slide(&mut self.fonts, slide, index, total, config, assets);
            tracing::debug!(
                slide_id = slide.id,
                is_valid = validation.is_valid,
                "slide rendered"
            );
            images.push(image);
            validations.push(validation);
        }

        CarouselOutput {
            generation,
            images,
            validations,
        }
    }
}
