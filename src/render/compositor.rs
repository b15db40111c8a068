use vello_cpu::kurbo::{Affine, Rect, RoundedRect, Shape, Stroke};

use crate::assets::{self, SlideAssets};
use crate::config::{
    BASE_FONT_SIZE, BrandAnchor, CarouselType, CounterAnchor, RenderConfig, Slide, Template,
    TemplateStyle, TextAlign, ValidationResult,
};
use crate::fonts::{FontLibrary, TextMeasure};
use crate::foundation::color::Rgba8;
use crate::foundation::error::{KaruselError, KaruselResult};
use crate::layout::{LayoutParams, solve_layout, wrap_plain};

/// Overflow diagnostic shown to the author when shrink-to-fit bottoms out.
pub const OVERFLOW_MESSAGE: &str = "Текст не помещается на слайд";

/// Darkening overlay painted over photo backgrounds for text legibility.
const PHOTO_OVERLAY_ALPHA: u8 = 115;

/// Card template: inset of the card from the canvas edge.
const CARD_MARGIN: f64 = 40.0;

/// One finished slide raster.
#[derive(Clone, Debug)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Draws one slide at a time into a fresh raster context.
///
/// Rendering is deliberately infallible at the batch level: any per-slide
/// error is folded into its [`ValidationResult`] and the batch moves on.
#[derive(Default)]
pub struct SlideCompositor;

impl SlideCompositor {
    pub fn new() -> Self {
        Self
    }

    pub fn render_slide(
        &mut self,
        fonts: &mut FontLibrary,
        slide: &Slide,
        index: usize,
        total: usize,
        config: &RenderConfig,
        assets: &SlideAssets,
    ) -> (Option<RenderedImage>, ValidationResult) {
        match self.render_slide_inner(fonts, slide, index, total, config, assets) {
            Ok((image, validation)) => (Some(image), validation),
            Err(err) => {
                tracing::error!(slide_id = slide.id, error = %err, "slide render failed");
                (None, ValidationResult::failed(slide.id, err.to_string()))
            }
        }
    }

    fn render_slide_inner(
        &mut self,
        fonts: &mut FontLibrary,
        slide: &Slide,
        index: usize,
        total: usize,
        config: &RenderConfig,
        assets: &SlideAssets,
    ) -> KaruselResult<(RenderedImage, ValidationResult)> {
        let spec = config.format.spec();
        let w16: u16 = spec
            .width
            .try_into()
            .map_err(|_| KaruselError::render("canvas width exceeds u16"))?;
        let h16: u16 = spec
            .height
            .try_into()
            .map_err(|_| KaruselError::render("canvas height exceeds u16"))?;
        let (w, h) = (f64::from(spec.width), f64::from(spec.height));

        let template = config.template()?;
        let mut ctx = vello_cpu::RenderContext::new(w16, h16);

        let pad_inset = draw_background(&mut ctx, &template, assets, w, h)?;
        let padding = f64::from(spec.padding) + pad_inset;

        // Overlays anchor off the format padding, not the card-adjusted one.
        let base_padding = f64::from(spec.padding);

        let validation = if slide.is_special_final {
            draw_bonus_slide(
                &mut ctx,
                fonts,
                slide,
                config,
                assets,
                &template,
                w,
                h,
                base_padding,
            )?
        } else {
            let v = draw_text_block(
                &mut ctx, fonts, slide, index, total, config, &template, w, h, padding,
                spec.min_font_size,
            )?;
            draw_branding(&mut ctx, fonts, config, assets, &template, w, h, base_padding)?;
            if config.show_slide_count {
                draw_counter(
                    &mut ctx,
                    fonts,
                    config,
                    &template,
                    index,
                    total,
                    w,
                    h,
                    base_padding,
                )?;
            }
            v
        };

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        let png = assets::encode_png(pixmap.data_as_u8_slice(), spec.width, spec.height)?;
        Ok((
            RenderedImage {
                png,
                width: spec.width,
                height: spec.height,
            },
            validation,
        ))
    }
}

fn paint(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

/// Paint the template background. Returns any extra text inset the template
/// imposes (the card template shrinks the usable text area).
fn draw_background(
    ctx: &mut vello_cpu::RenderContext,
    template: &Template,
    assets: &SlideAssets,
    w: f64,
    h: f64,
) -> KaruselResult<f64> {
    ctx.set_transform(Affine::IDENTITY);
    let full = Rect::new(0.0, 0.0, w, h);

    match &template.style {
        TemplateStyle::Flat { bg } => {
            ctx.set_paint(paint(*bg));
            ctx.fill_rect(&full);
            Ok(0.0)
        }
        TemplateStyle::Gradient { top, bottom } => {
            let buffer = vertical_gradient_premul(w as u32, h as u32, *top, *bottom);
            let pixmap = assets::pixmap_from_premul(&buffer, w as u32, h as u32)?;
            ctx.set_paint(vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            });
            ctx.fill_rect(&full);
            Ok(0.0)
        }
        TemplateStyle::Image { fallback } => {
            match &assets.background {
                Some(bg) => {
                    let (draw_w, _, ox, oy) = assets::cover_fit(bg.width, bg.height, w, h);
                    let scale = draw_w / f64::from(bg.width.max(1));
                    ctx.set_transform(Affine::translate((ox, oy)) * Affine::scale(scale));
                    ctx.set_paint(assets::image_paint(bg)?);
                    ctx.fill_rect(&Rect::new(
                        0.0,
                        0.0,
                        f64::from(bg.width),
                        f64::from(bg.height),
                    ));
                    ctx.set_transform(Affine::IDENTITY);
                }
                None => {
                    ctx.set_paint(paint(*fallback));
                    ctx.fill_rect(&full);
                }
            }
            // Legibility scrim over the photo.
            ctx.set_paint(paint(Rgba8::rgba(0, 0, 0, PHOTO_OVERLAY_ALPHA)));
            ctx.fill_rect(&full);
            Ok(0.0)
        }
        TemplateStyle::CardInset { bg, card } => {
            ctx.set_paint(paint(*bg));
            ctx.fill_rect(&full);

            let card_rect =
                RoundedRect::new(CARD_MARGIN, CARD_MARGIN, w - CARD_MARGIN, h - CARD_MARGIN, 24.0);
            let shadow = RoundedRect::new(
                CARD_MARGIN + 6.0,
                CARD_MARGIN + 10.0,
                w - CARD_MARGIN + 6.0,
                h - CARD_MARGIN + 10.0,
                24.0,
            );
            ctx.set_paint(paint(Rgba8::rgba(0, 0, 0, 50)));
            ctx.fill_path(&shadow.to_path(0.1));
            ctx.set_paint(paint(*card));
            ctx.fill_path(&card_rect.to_path(0.1));
            Ok(CARD_MARGIN)
        }
        TemplateStyle::RuledPaper { bg, rule } => {
            ctx.set_paint(paint(*bg));
            ctx.fill_rect(&full);

            ctx.set_paint(paint(rule.with_alpha(46)));
            let spacing = 56.0;
            let mut y = spacing * 2.0;
            while y < h - spacing {
                ctx.fill_rect(&Rect::new(0.0, y, w, y + 1.5));
                y += spacing;
            }
            Ok(0.0)
        }
    }
}

/// Opaque premultiplied vertical gradient buffer sized to the canvas.
pub(crate) fn vertical_gradient_premul(w: u32, h: u32, top: Rgba8, bottom: Rgba8) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        let t = if h > 1 {
            y as f32 / (h - 1) as f32
        } else {
            0.0
        };
        let c = top.lerp(bottom, t);
        for _ in 0..w {
            buffer.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }
    buffer
}

/// Alignment actually painted for a slide: list-like content forces left off
/// the cover; everything else, the cover included, honors the per-slide
/// override then the global setting. Justify has no distinct paint pass.
fn resolve_align(
    is_cover: bool,
    carousel_type: CarouselType,
    override_align: Option<TextAlign>,
    global: TextAlign,
) -> TextAlign {
    if !is_cover && carousel_type.forces_left_align() {
        return TextAlign::Left;
    }
    match override_align.unwrap_or(global) {
        TextAlign::Justify => TextAlign::Left,
        other => other,
    }
}

/// Shape and paint one styled run at `(x, top_y)`. Returns its advance width.
fn draw_text_run(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    text: &str,
    family: &str,
    bold: bool,
    size_px: f32,
    color: Rgba8,
    x: f64,
    top_y: f64,
) -> KaruselResult<f64> {
    let layout = fonts.layout_run(text, family, bold, size_px, color)?;
    let font = fonts.font_data(family)?.clone();
    let width = f64::from(layout.width());

    ctx.set_transform(Affine::translate((x, top_y)));
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(paint(brush));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    ctx.set_transform(Affine::IDENTITY);
    Ok(width)
}

/// Centered single-line convenience wrapper around [`draw_text_run`].
fn draw_centered_text(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    text: &str,
    family: &str,
    bold: bool,
    size_px: f32,
    color: Rgba8,
    canvas_w: f64,
    top_y: f64,
) -> KaruselResult<()> {
    let width = f64::from(fonts.text_width(text, family, bold, size_px)?);
    draw_text_run(
        ctx,
        fonts,
        text,
        family,
        bold,
        size_px,
        color,
        (canvas_w - width) / 2.0,
        top_y,
    )?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn draw_text_block(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    slide: &Slide,
    index: usize,
    total: usize,
    config: &RenderConfig,
    template: &Template,
    w: f64,
    h: f64,
    padding: f64,
    min_font_size: f32,
) -> KaruselResult<ValidationResult> {
    let ov = config.override_for(slide.id);
    let params = LayoutParams::for_slide(
        index,
        total,
        config.carousel_type,
        BASE_FONT_SIZE * ov.font_size_scale,
        min_font_size,
        (w - 2.0 * padding) as f32,
        (h - 3.5 * padding) as f32,
        ov.line_height_scale,
    );
    let solved = solve_layout(&slide.text, &params, &config.font_pair, fonts)?;

    let is_cover = index == 0;
    let align = resolve_align(is_cover, config.carousel_type, ov.text_align, config.text_align);

    // Slight upward bias on covers reads better under the branding overlay.
    let bias = if is_cover { 0.48 } else { 0.5 };
    let mut y = ((h - f64::from(solved.total_height)) * bias).max(padding);

    for line in &solved.lines {
        let mut x = match align {
            TextAlign::Center => (w - f64::from(line.width)) / 2.0,
            TextAlign::Left | TextAlign::Justify => padding,
        };
        for seg in &line.segments {
            let family = if line.is_header {
                &config.font_pair.header_family
            } else {
                &config.font_pair.body_family
            };
            let color = seg.color.unwrap_or(template.text_color);
            let advance = draw_text_run(
                ctx,
                fonts,
                &seg.text,
                family,
                seg.is_bold || line.is_header,
                line.font_size_px,
                color,
                x,
                y,
            )?;
            x += advance;
        }
        y += f64::from(line.font_size_px * ov.line_height_scale + line.gap_after);
    }

    if solved.is_valid {
        Ok(ValidationResult::ok(slide.id, solved.font_size_used))
    } else {
        Ok(ValidationResult::failed(slide.id, OVERFLOW_MESSAGE))
    }
}

/// The synthetic call-to-action slide: lead-in text, the code word in a
/// stadium outline, follow-up text, then an avatar/nickname branding block.
#[allow(clippy::too_many_arguments)]
fn draw_bonus_slide(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    slide: &Slide,
    config: &RenderConfig,
    assets: &SlideAssets,
    template: &Template,
    w: f64,
    h: f64,
    padding: f64,
) -> KaruselResult<ValidationResult> {
    let fs = &config.final_slide;
    let body = &config.font_pair.body_family;
    let header = &config.font_pair.header_family;
    let text_color = template.text_color;

    let body_size = (0.045 * w) as f32;
    let code_size = (0.07 * w) as f32;
    let line_step = f64::from(body_size) * 1.3;
    let max_width = (w * 0.8) as f32;

    let mut y = 0.15 * h + 0.45 * h * (f64::from(fs.vertical_offset) / 100.0);

    for line in wrap_plain(&fs.text_before, body, false, body_size, max_width, fonts)? {
        draw_centered_text(ctx, fonts, &line, body, false, body_size, text_color, w, y)?;
        y += line_step;
    }
    y += line_step * 0.4;

    // Code word inside a stadium outline.
    let code_width = f64::from(fonts.text_width(&fs.code_word, header, true, code_size)?);
    let pill_w = (code_width + 140.0).max(200.0);
    let pill_h = f64::from(code_size) + 70.0;
    let pill = RoundedRect::new(
        (w - pill_w) / 2.0,
        y,
        (w + pill_w) / 2.0,
        y + pill_h,
        pill_h / 2.0,
    );
    ctx.set_transform(Affine::IDENTITY);
    ctx.set_paint(paint(text_color));
    ctx.set_stroke(Stroke::new(5.0));
    ctx.stroke_path(&pill.to_path(0.1));
    draw_centered_text(
        ctx,
        fonts,
        &fs.code_word,
        header,
        true,
        code_size,
        text_color,
        w,
        y + (pill_h - f64::from(code_size) * 1.2) / 2.0,
    )?;
    y += pill_h + line_step * 0.8;

    for line in wrap_plain(&fs.text_after, body, false, body_size, max_width, fonts)? {
        draw_centered_text(ctx, fonts, &line, body, false, body_size, text_color, w, y)?;
        y += line_step;
    }

    // Branding row, left-aligned at the padding edge: avatar with the
    // nickname beside it, topic line(s) wrapped to the remaining width.
    let brand_y = 0.65 * h + 0.25 * h * (f64::from(fs.branding_offset) / 100.0);
    let avatar_size = 0.16 * w;
    let mut text_x = padding;
    let mut text_y = brand_y;
    if let Some(avatar) = &assets.avatar {
        let scale = avatar_size / f64::from(avatar.width.max(1));
        ctx.set_transform(Affine::translate((padding, brand_y)) * Affine::scale(scale));
        ctx.set_paint(assets::image_paint(avatar)?);
        ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(avatar.width),
            f64::from(avatar.height),
        ));
        ctx.set_transform(Affine::IDENTITY);
        text_x = padding + avatar_size + 30.0;
        text_y = brand_y + avatar_size * 0.15;
    }

    let nick_size = (0.05 * w) as f32;
    let nick_name = if config.nickname.is_empty() {
        "username"
    } else {
        config.nickname.as_str()
    };
    draw_text_run(
        ctx, fonts, nick_name, header, true, nick_size, text_color, text_x, text_y,
    )?;
    text_y += f64::from(nick_size) * 1.4;

    let topic_size = (0.035 * w) as f32;
    let topic = if fs.blog_topic.is_empty() {
        "Подписывайся!".to_string()
    } else {
        format!("у меня в блоге все про {}", fs.blog_topic)
    };
    let topic_width = (w - text_x - padding) as f32;
    for line in wrap_plain(&topic, body, false, topic_size, topic_width, fonts)? {
        draw_text_run(
            ctx,
            fonts,
            &line,
            body,
            false,
            topic_size,
            text_color.with_alpha(153),
            text_x,
            text_y,
        )?;
        text_y += f64::from(topic_size) * 1.4;
    }

    Ok(ValidationResult::ok(slide.id, body_size))
}

/// Nickname and/or avatar overlay in one of six anchor positions. Either
/// element can stand alone.
fn draw_branding(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    config: &RenderConfig,
    assets: &SlideAssets,
    template: &Template,
    w: f64,
    h: f64,
    padding: f64,
) -> KaruselResult<()> {
    if config.nickname.is_empty() && assets.avatar.is_none() {
        return Ok(());
    }

    let margin_x = padding;
    let margin_y = padding / 1.1;
    let size = (0.028 * w) as f32;
    let avatar_size = 0.06 * w;
    let color = template.text_color.with_alpha(204);

    let nick = (!config.nickname.is_empty()).then(|| format!("@{}", config.nickname));
    let text_width = match &nick {
        Some(nick) => {
            f64::from(fonts.text_width(nick, &config.font_pair.body_family, true, size)?)
        }
        None => 0.0,
    };
    let avatar_slot = match (assets.avatar.is_some(), nick.is_some()) {
        (true, true) => avatar_size + 12.0,
        (true, false) => avatar_size,
        (false, _) => 0.0,
    };
    let total_width = avatar_slot + text_width;

    let x = match config.brand_anchor {
        BrandAnchor::TopLeft | BrandAnchor::BottomLeft => margin_x,
        BrandAnchor::TopCenter | BrandAnchor::BottomCenter => (w - total_width) / 2.0,
        BrandAnchor::TopRight | BrandAnchor::BottomRight => w - margin_x - total_width,
    };
    let y = if config.brand_anchor.is_top() {
        margin_y
    } else {
        h - margin_y - avatar_size.max(f64::from(size) * 1.3)
    };

    if let Some(avatar) = &assets.avatar {
        let scale = avatar_size / f64::from(avatar.width.max(1));
        ctx.set_transform(Affine::translate((x, y)) * Affine::scale(scale));
        ctx.set_paint(assets::image_paint(avatar)?);
        ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(avatar.width),
            f64::from(avatar.height),
        ));
        ctx.set_transform(Affine::IDENTITY);
    }

    if let Some(nick) = &nick {
        let text_y = y + (avatar_slot - f64::from(size)).max(0.0) / 2.0;
        draw_text_run(
            ctx,
            fonts,
            nick,
            &config.font_pair.body_family,
            true,
            size,
            color,
            x + avatar_slot,
            text_y,
        )?;
    }
    Ok(())
}

/// `N/total` position marker in the top-right or bottom-right corner. Shares
/// the branding font and size at a fainter alpha.
#[allow(clippy::too_many_arguments)]
fn draw_counter(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut FontLibrary,
    config: &RenderConfig,
    template: &Template,
    index: usize,
    total: usize,
    w: f64,
    h: f64,
    padding: f64,
) -> KaruselResult<()> {
    let margin_x = padding;
    let margin_y = padding / 1.1;
    let size = (0.028 * w) as f32;
    let text = format!("{}/{}", index + 1, total);
    let color = template.text_color.with_alpha(153);

    let width = f64::from(fonts.text_width(&text, &config.font_pair.body_family, true, size)?);
    let x = w - margin_x - width;
    let y = match config.counter_anchor {
        CounterAnchor::TopRight => margin_y,
        CounterAnchor::BottomRight => h - margin_y - f64::from(size) * 1.3,
    };
    draw_text_run(
        ctx,
        fonts,
        &text,
        &config.font_pair.body_family,
        true,
        size,
        color,
        x,
        y,
    )?;
    Ok(())
}
