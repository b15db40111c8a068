use std::path::{Path, PathBuf};

use karusel::{
    CarouselRenderer, FontPair, RenderConfig, SlideAssets, SplitMethod, assemble_slides,
};

/// Recursively look for a usable font file under the common system font roots.
/// Tests that need real glyphs skip cleanly when none is found.
fn find_system_font() -> Option<PathBuf> {
    let roots = [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ];
    roots.iter().find_map(|root| scan_for_font(Path::new(root)))
}

fn scan_for_font(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut dirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("ttf" | "otf")
        ) {
            return Some(path);
        }
    }
    dirs.iter().find_map(|d| scan_for_font(d))
}

fn renderer_with_font() -> Option<(CarouselRenderer, FontPair)> {
    let font_path = find_system_font()?;
    let bytes = std::fs::read(&font_path).ok()?;
    let mut renderer = CarouselRenderer::new();
    let family = renderer.register_font(bytes).ok()?;
    let pair = FontPair {
        id: "test".to_string(),
        name: "Test".to_string(),
        header_family: family.clone(),
        body_family: family,
    };
    Some((renderer, pair))
}

fn solid_png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Leftmost column containing a pixel that differs from the background.
fn leftmost_foreground_x(png: &[u8], bg: [u8; 3]) -> Option<u32> {
    let img = image::load_from_memory(png).unwrap().to_rgba8();
    let (w, h) = img.dimensions();
    for x in 0..w {
        for y in 0..h {
            let p = img.get_pixel(x, y).0;
            if p[0] != bg[0] || p[1] != bg[1] || p[2] != bg[2] {
                return Some(x);
            }
        }
    }
    None
}

fn greenish_columns(png: &[u8]) -> Vec<u32> {
    let img = image::load_from_memory(png).unwrap().to_rgba8();
    let (w, h) = img.dimensions();
    let mut cols = Vec::new();
    'col: for x in 0..w {
        for y in 0..h {
            let p = img.get_pixel(x, y).0;
            if p[1] > 180 && p[0] < 100 && p[2] < 100 {
                cols.push(x);
                continue 'col;
            }
        }
    }
    cols
}

#[test]
fn full_carousel_renders_decodable_pngs() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let config = RenderConfig {
        font_pair,
        nickname: "author".to_string(),
        show_slide_count: true,
        ..RenderConfig::default()
    };
    let text = "Заголовок карусели\n\nПервый слайд с **жирным** текстом\n\nВторой слайд";
    let slides = assemble_slides(text, SplitMethod::EmptyLine, None);
    assert_eq!(slides.len(), 3);

    let out = renderer.render_all(&slides, &config, &SlideAssets::default());
    assert!(out.all_valid(), "{:?}", out.validations);
    assert_eq!(out.images.len(), 3);

    let spec = config.format.spec();
    for image in out.images.iter().map(|i| i.as_ref().unwrap()) {
        assert_eq!((image.width, image.height), (spec.width, spec.height));
        let decoded = image::load_from_memory(&image.png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (spec.width, spec.height));
        // The default template is a dark fill, so something must be painted.
        assert!(decoded.pixels().any(|p| p.0[3] == 255));
    }

    // Cover and body slides must not be pixel-identical.
    let a = &out.images[0].as_ref().unwrap().png;
    let b = &out.images[1].as_ref().unwrap().png;
    assert_ne!(a, b);
}

#[test]
fn rendering_is_deterministic() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let config = RenderConfig {
        font_pair,
        ..RenderConfig::default()
    };
    let slides = assemble_slides("Один слайд текста", SplitMethod::EmptyLine, None);

    let first = renderer.render_all(&slides, &config, &SlideAssets::default());
    let second = renderer.render_all(&slides, &config, &SlideAssets::default());
    assert!(second.generation > first.generation);
    assert_eq!(
        first.images[0].as_ref().unwrap().png,
        second.images[0].as_ref().unwrap().png
    );
}

#[test]
fn overflowing_slide_still_renders_with_failed_validation() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let config = RenderConfig {
        font_pair,
        ..RenderConfig::default()
    };
    let word = "слово ".repeat(600);
    let slides = assemble_slides(&word, SplitMethod::EmptyLine, None);

    let out = renderer.render_all(&slides, &config, &SlideAssets::default());
    assert!(!out.all_valid());
    assert!(out.images[0].is_some(), "best-effort raster still produced");
    let v = &out.validations[0];
    assert_eq!(v.error.as_deref(), Some("Текст не помещается на слайд"));
}

#[test]
fn cover_respects_left_alignment() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    // Default template is #121212; left-aligned text must start near the
    // 100px padding edge, far from the horizontal center.
    let config = RenderConfig {
        font_pair,
        ..RenderConfig::default()
    };
    let slides = assemble_slides("Hi", SplitMethod::EmptyLine, None);
    let out = renderer.render_all(&slides, &config, &SlideAssets::default());

    let png = &out.images[0].as_ref().unwrap().png;
    let leftmost = leftmost_foreground_x(png, [18, 18, 18]).expect("text painted");
    assert!(leftmost < 300, "leftmost text pixel at x={leftmost}, expected near padding");
}

#[test]
fn avatar_paints_without_nickname() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let config = RenderConfig {
        font_pair,
        ..RenderConfig::default()
    };
    assert!(config.nickname.is_empty());

    let avatar = solid_png(16, 16, [0, 255, 0, 255]);
    let assets = SlideAssets::resolve(Some(&avatar), None);
    let slides = assemble_slides("Текст", SplitMethod::EmptyLine, None);
    let out = renderer.render_all(&slides, &config, &assets);

    let png = &out.images[0].as_ref().unwrap().png;
    assert!(
        !greenish_columns(png).is_empty(),
        "avatar must be painted even with an empty nickname"
    );
}

#[test]
fn bonus_branding_row_is_left_aligned() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let mut config = RenderConfig {
        font_pair,
        nickname: "author".to_string(),
        ..RenderConfig::default()
    };
    config.final_slide.enabled = true;

    let avatar = solid_png(16, 16, [0, 255, 0, 255]);
    let assets = SlideAssets::resolve(Some(&avatar), None);
    let slides = assemble_slides("Текст", SplitMethod::EmptyLine, Some(&config.final_slide));
    let out = renderer.render_all(&slides, &config, &assets);

    // The bonus avatar sits at the padding edge, not centered.
    let png = &out.images[1].as_ref().unwrap().png;
    let cols = greenish_columns(png);
    let first = *cols.first().expect("bonus avatar painted");
    assert!(first < 300, "avatar starts at x={first}, expected near the 100px padding");
}

#[test]
fn counter_renders_even_for_a_single_slide() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let base = RenderConfig {
        font_pair,
        ..RenderConfig::default()
    };
    let slides = assemble_slides("Один", SplitMethod::EmptyLine, None);

    let without = renderer.render_all(&slides, &base, &SlideAssets::default());
    let with_counter = RenderConfig {
        show_slide_count: true,
        ..base
    };
    let with = renderer.render_all(&slides, &with_counter, &SlideAssets::default());

    assert_ne!(
        without.images[0].as_ref().unwrap().png,
        with.images[0].as_ref().unwrap().png,
        "1/1 counter must be painted when enabled"
    );
}

#[test]
fn bonus_slide_and_templates_render() {
    let Some((mut renderer, font_pair)) = renderer_with_font() else {
        eprintln!("skipping: no system font found");
        return;
    };

    let mut config = RenderConfig {
        font_pair,
        nickname: "author".to_string(),
        ..RenderConfig::default()
    };
    config.final_slide.enabled = true;
    config.final_slide.blog_topic = "дизайн".to_string();

    for template_id in ["black", "white", "dusk", "card", "paper", "custom-image"] {
        config.template_id = template_id.to_string();
        let slides = assemble_slides(
            "Текст слайда",
            SplitMethod::EmptyLine,
            Some(&config.final_slide),
        );
        assert_eq!(slides.len(), 2);
        assert!(slides[1].is_special_final);

        let out = renderer.render_all(&slides, &config, &SlideAssets::default());
        assert!(out.all_valid(), "template {template_id}: {:?}", out.validations);
        assert!(out.images.iter().all(|i| i.is_some()), "template {template_id}");
    }
}
