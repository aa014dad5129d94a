use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use photo_watermark::config::AppConfig;
use photo_watermark::logging::{init_subscriber, LogFormat};
use photo_watermark::watermark::{ImageCache, WatermarkEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Photo Watermark - rotation-aware text and image watermarks for photographs
#[derive(Parser, Debug)]
#[command(name = "photo-watermark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark a single image
    Apply {
        /// Path to configuration file (YAML or JSON)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Image to watermark
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the result
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List installed font families, or resolve one
    Fonts {
        /// Path to configuration file for extra font directories
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Resolve this family instead of listing all families
        #[arg(long)]
        family: Option<String>,

        #[arg(long)]
        bold: bool,

        #[arg(long)]
        italic: bool,

        /// Preferred style string, e.g. "Semibold"
        #[arg(long)]
        style: Option<String>,
    },
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config = AppConfig::from_file(path)
        .map_err(photo_watermark::Error::Config)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config
        .validate()
        .map_err(photo_watermark::Error::Config)
        .context("Invalid configuration")?;
    Ok(config)
}

fn run_apply(config_path: &Path, input: &Path, output: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    tracing::info!(
        config_file = %config_path.display(),
        watermark_type = ?config.watermark.watermark_type,
        extra_font_dirs = config.fonts.extra_dirs.len(),
        output_format = ?config.export.output_format,
        "Configuration loaded successfully"
    );

    let engine = WatermarkEngine::new(
        Arc::new(config.fonts.build_loader()),
        ImageCache::default(),
    );

    let photo = image::open(input)
        .with_context(|| format!("Failed to open input image {}", input.display()))?;

    let outcome = engine
        .apply_watermark(&photo, &config.watermark)
        .with_context(|| format!("Failed to watermark {}", input.display()))?;

    if let Some(reason) = &outcome.skipped {
        tracing::warn!(input = %input.display(), reason = ?reason, "Watermark not drawn");
    }

    config
        .export
        .write_image(&outcome.image, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        width = outcome.image.width(),
        height = outcome.image.height(),
        font = %outcome.font.as_ref().map(ToString::to_string).unwrap_or_else(|| "none".to_string()),
        center = ?outcome.center.map(|c| (c.x, c.y)),
        "Watermark applied"
    );
    Ok(())
}

fn run_fonts(
    config_path: Option<&Path>,
    family: Option<&str>,
    bold: bool,
    italic: bool,
    style: Option<&str>,
) -> anyhow::Result<()> {
    let fonts = match config_path {
        Some(path) => load_config(path)?.fonts,
        None => Default::default(),
    };
    let loader = fonts.build_loader();
    let catalog = loader.catalog();

    match family {
        None => {
            for name in catalog.families() {
                println!("{name}");
            }
        }
        Some(family) => match catalog.resolve(family, bold, italic, style) {
            Some((path, index)) => println!("{}#{}", path.display(), index),
            None => bail!("No installed font matches family '{family}'"),
        },
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A subscriber may already be installed when embedded; keep going either way
    let _ = init_subscriber(args.log_format);

    match &args.command {
        Command::Apply {
            config,
            input,
            output,
        } => run_apply(config, input, output),
        Command::Fonts {
            config,
            family,
            bold,
            italic,
            style,
        } => run_fonts(
            config.as_deref(),
            family.as_deref(),
            *bold,
            *italic,
            style.as_deref(),
        ),
    }
}
