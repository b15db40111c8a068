use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(name = "karusel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a carousel job to a directory of PNGs.
    Render(RenderArgs),
    /// List the built-in design templates.
    Templates,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `carousel_N.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

/// One render request: raw text, how to split it, the render configuration,
/// and the file assets it references. Relative paths resolve against the job
/// file's directory.
#[derive(Debug, Deserialize)]
struct RenderJob {
    text: String,
    #[serde(default)]
    split_method: karusel::SplitMethod,
    #[serde(default)]
    config: karusel::RenderConfig,
    /// Font files to register; must cover the configured font pair.
    fonts: Vec<PathBuf>,
    #[serde(default)]
    avatar: Option<PathBuf>,
    #[serde(default)]
    background: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Templates => cmd_templates(),
    }
}

fn read_job_json(path: &Path) -> anyhow::Result<RenderJob> {
    let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
    let r = BufReader::new(f);
    let job: RenderJob = serde_json::from_reader(r).with_context(|| "parse job JSON")?;
    Ok(job)
}

fn read_asset(root: &Path, path: &Path) -> anyhow::Result<Vec<u8>> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    std::fs::read(&resolved).with_context(|| format!("read asset '{}'", resolved.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.in_path)?;
    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));

    let mut renderer = karusel::CarouselRenderer::new();
    for font_path in &job.fonts {
        let bytes = read_asset(assets_root, font_path)?;
        let family = renderer
            .register_font(bytes)
            .with_context(|| format!("register font '{}'", font_path.display()))?;
        eprintln!("registered font family '{family}'");
    }

    let avatar = job
        .avatar
        .as_deref()
        .map(|p| read_asset(assets_root, p))
        .transpose()?;
    let background = job
        .background
        .as_deref()
        .map(|p| read_asset(assets_root, p))
        .transpose()?;
    let assets = karusel::SlideAssets::resolve(avatar.as_deref(), background.as_deref());

    let final_slide = job.config.final_slide.enabled.then(|| &job.config.final_slide);
    let slides = karusel::assemble_slides(&job.text, job.split_method, final_slide);
    anyhow::ensure!(!slides.is_empty(), "job text produced no slides");

    let output = renderer.render_all(&slides, &job.config, &assets);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut written = 0usize;
    for (i, image) in output.images.iter().enumerate() {
        let Some(image) = image else {
            continue;
        };
        let out_path = args.out_dir.join(karusel::CarouselOutput::entry_name(i));
        std::fs::write(&out_path, &image.png)
            .with_context(|| format!("write png '{}'", out_path.display()))?;
        written += 1;
    }

    for v in &output.validations {
        match (&v.error, v.font_size_used) {
            (Some(err), _) => eprintln!("slide {}: {err}", v.slide_id),
            (None, Some(size)) => eprintln!("slide {}: ok at {size}px", v.slide_id),
            (None, None) => eprintln!("slide {}: ok", v.slide_id),
        }
    }
    eprintln!(
        "wrote {written}/{} slides to {}",
        output.images.len(),
        args.out_dir.display()
    );

    // Fit failures are author feedback, not process failures; only a slide
    // that produced no image at all fails the run.
    if output.images.iter().any(|i| i.is_none()) {
        anyhow::bail!("some slides failed to render");
    }
    Ok(())
}

fn cmd_templates() -> anyhow::Result<()> {
    for t in karusel::config::builtin_templates() {
        println!("{:<14} {}", t.id, t.name);
    }
    Ok(())
}
