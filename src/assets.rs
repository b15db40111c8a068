use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{KaruselError, KaruselResult};

/// Decoded raster image, premultiplied, ready for the compositor.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Optional per-carousel imagery, resolved once before rendering.
#[derive(Default)]
pub struct SlideAssets {
    pub avatar: Option<PreparedImage>,
    pub background: Option<PreparedImage>,
}

impl SlideAssets {
    /// Decode whatever bytes are present. A corrupt or unsupported image is
    /// logged and dropped; rendering proceeds without it.
    pub fn resolve(avatar_bytes: Option<&[u8]>, background_bytes: Option<&[u8]>) -> Self {
        let avatar = avatar_bytes.and_then(|bytes| match decode_image(bytes) {
            Ok(img) => Some(circle_mask(&img)),
            Err(err) => {
                tracing::warn!(error = %err, "avatar image failed to decode; skipping");
                None
            }
        });
        let background = background_bytes.and_then(|bytes| match decode_image(bytes) {
            Ok(img) => Some(img),
            Err(err) => {
                tracing::warn!(error = %err, "background image failed to decode; skipping");
                None
            }
        });
        Self { avatar, background }
    }
}

pub fn decode_image(bytes: &[u8]) -> KaruselResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

pub fn pixmap_from_premul(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> KaruselResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KaruselError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KaruselError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(KaruselError::render("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// Image paint for the rasterizer; drawn with `fill_rect` at its pixel size.
pub fn image_paint(img: &PreparedImage) -> KaruselResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul(img.rgba8_premul.as_slice(), img.width, img.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Cover-fit placement: scale so the image fills `dst` entirely, centering the
/// overflow. Returns `(draw_width, draw_height, offset_x, offset_y)`.
pub fn cover_fit(src_w: u32, src_h: u32, dst_w: f64, dst_h: f64) -> (f64, f64, f64, f64) {
    let sw = f64::from(src_w.max(1));
    let sh = f64::from(src_h.max(1));
    let scale = (dst_w / sw).max(dst_h / sh);
    let draw_w = sw * scale;
    let draw_h = sh * scale;
    (draw_w, draw_h, (dst_w - draw_w) / 2.0, (dst_h - draw_h) / 2.0)
}

/// Center-crop to a square and apply an antialiased circular alpha mask.
/// Used for avatars so the compositor can paint them as plain image fills.
pub fn circle_mask(img: &PreparedImage) -> PreparedImage {
    let side = img.width.min(img.height);
    let x0 = (img.width - side) / 2;
    let y0 = (img.height - side) / 2;

    let center = side as f32 / 2.0;
    let radius = center;

    let mut out = Vec::with_capacity(side as usize * side as usize * 4);
    for y in 0..side {
        let src_y = (y0 + y) as usize;
        for x in 0..side {
            let src_x = (x0 + x) as usize;
            let i = (src_y * img.width as usize + src_x) * 4;
            let px = &img.rgba8_premul[i..i + 4];

            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let dist = (dx * dx + dy * dy).sqrt();
            // One-pixel antialiased edge.
            let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);

            // Premultiplied data, so coverage scales every channel.
            for &c in px {
                out.push((c as f32 * coverage).round() as u8);
            }
        }
    }

    PreparedImage {
        width: side,
        height: side,
        rgba8_premul: Arc::new(out),
    }
}

/// Encode premultiplied pixels as a straight-alpha RGBA PNG.
pub fn encode_png(rgba8_premul: &[u8], width: u32, height: u32) -> KaruselResult<Vec<u8>> {
    use image::ImageEncoder;

    let mut straight = rgba8_premul.to_vec();
    unpremultiply_rgba8_in_place(&mut straight);

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(&straight, width, height, image::ExtendedColorType::Rgba8)
        .context("encode png")?;
    Ok(png)
}
