//! pixelart: turn an image file into pixel art from the command line.
//!
//! Loads an image, applies a preset and/or explicit parameters through
//! the same processor the browser front end uses, and writes the result
//! as PNG, JPEG, or WebP.
//!
//! # Usage
//!
//! ```text
//! pixelart photo.jpg -o photo-8bit.png --preset game
//! pixelart photo.jpg -o out.jpg --pixel-size 6 --color-mode sepia --edge-mode soft
//! pixelart --list-presets
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use pixelart_export::{
    DEFAULT_QUALITY, ExportFormat, ExportOptions, encode, format_file_size, resolve_format,
    supported_formats,
};
use pixelart_pipeline::presets::preset;
use pixelart_pipeline::{
    ColorMode, EdgeMode, ImageProcessor, MemoryTarget, Outcome, PRESETS, PixelationOptions,
    PresetId, ProcessingProgress, ProcessorConfig,
};

/// Turn an image into pixel art.
///
/// Parameters start from the defaults (8px, original colors, hard edges),
/// are replaced by `--preset` when given, and are then overridden by any
/// individual flag. `--config-json` replaces all of them at once.
#[derive(Parser)]
#[command(name = "pixelart", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    #[arg(required_unless_present_any = ["list_presets", "list_formats"])]
    input: Option<PathBuf>,

    /// Output file, or an existing directory to write a generated name into.
    #[arg(
        short,
        long,
        required_unless_present_any = ["list_presets", "list_formats"]
    )]
    output: Option<PathBuf>,

    /// Start from a named preset (see --list-presets).
    #[arg(long, value_name = "ID")]
    preset: Option<PresetId>,

    /// Edge length of each output block in source pixels.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pixel_size: Option<u32>,

    /// Color mode: original, retro, grayscale, sepia, vibrant.
    #[arg(long, value_name = "MODE")]
    color_mode: Option<ColorMode>,

    /// Edge mode: hard or soft.
    #[arg(long, value_name = "MODE")]
    edge_mode: Option<EdgeMode>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    format: Option<ExportFormat>,

    /// Lossy quality in 0.0..=1.0 (JPEG only).
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = parse_quality)]
    quality: f32,

    /// Full pixelation options as JSON, e.g.
    /// '{"pixelSize":12,"colorMode":"retro","edgeMode":"hard"}'.
    #[arg(
        long,
        value_name = "JSON",
        conflicts_with_all = ["preset", "pixel_size", "color_mode", "edge_mode"]
    )]
    config_json: Option<String>,

    /// Print the preset catalog and exit.
    #[arg(long)]
    list_presets: bool,

    /// Print the export formats this build can encode and exit.
    #[arg(long)]
    list_formats: bool,

    /// Log stage timings and history operations.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_quality(s: &str) -> Result<f32, String> {
    let quality: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&quality) {
        Ok(quality)
    } else {
        Err(format!("quality must be between 0.0 and 1.0, got {quality}"))
    }
}

// ---------------------------------------------------------------------------
// Option resolution
// ---------------------------------------------------------------------------

/// Combine `--config-json`, `--preset`, and the individual flags.
fn resolve_options(cli: &Cli) -> Result<PixelationOptions, String> {
    if let Some(json) = &cli.config_json {
        let options: PixelationOptions =
            serde_json::from_str(json).map_err(|e| format!("invalid --config-json: {e}"))?;
        options.validate()?;
        return Ok(options);
    }

    let mut options = cli
        .preset
        .map_or_else(PixelationOptions::default, |id| preset(id).options());
    if let Some(size) = cli.pixel_size {
        options.pixel_size = size;
    }
    if let Some(mode) = cli.color_mode {
        options.color_mode = mode;
    }
    if let Some(mode) = cli.edge_mode {
        options.edge_mode = mode;
    }
    Ok(options)
}

/// `--format`, else the output's extension, else PNG.
fn requested_format(explicit: Option<ExportFormat>, output: &Path) -> ExportFormat {
    explicit
        .or_else(|| {
            output
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

fn print_presets() {
    println!(
        "{:<10} {:<11} {:>5} {:<10} {:<5} {:<9} DESCRIPTION",
        "ID", "NAME", "SIZE", "COLOR", "EDGE", "CATEGORY"
    );
    for p in &PRESETS {
        println!(
            "{:<10} {:<11} {:>5} {:<10} {:<5} {:<9} {}",
            p.id.as_str(),
            p.display_name,
            p.pixel_size,
            p.color_mode.as_str(),
            p.edge_mode.as_str(),
            p.category.as_str(),
            p.description,
        );
    }
}

fn print_formats() {
    for format in supported_formats() {
        let quality = if format.supports_quality() {
            " (quality)"
        } else {
            ""
        };
        println!("{:<5} {}{quality}", format.extension(), format.mime_type());
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.list_presets || cli.list_formats {
        if cli.list_presets {
            print_presets();
        }
        if cli.list_formats {
            print_formats();
        }
        return ExitCode::SUCCESS;
    }

    // clap enforces both when no listing flag is given.
    let (Some(input), Some(output)) = (cli.input.as_deref(), cli.output.as_deref()) else {
        eprintln!("error: an input and --output are required");
        return ExitCode::FAILURE;
    };

    let options = match resolve_options(&cli) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let bytes = match std::fs::read(input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };

    let mut processor = match ImageProcessor::new(
        MemoryTarget::Available,
        MemoryTarget::Available,
        ProcessorConfig::default(),
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    processor.subscribe(|p: ProcessingProgress| {
        log::debug!("{:?} {}%", p.stage, p.progress);
    });

    let dims = match processor.load_bytes(&bytes) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {}: {e}", input.display());
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Loaded {} ({dims})", input.display());

    match processor.process(options).await {
        Ok(Outcome::Applied) => {}
        Ok(Outcome::Stale) => {
            eprintln!("error: result was superseded");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }
    let Some(result) = processor.processed() else {
        eprintln!("error: no result produced");
        return ExitCode::FAILURE;
    };

    let requested = requested_format(cli.format, output);
    let format = resolve_format(requested);
    if format != requested {
        log::warn!("{requested} encoding unavailable, writing {format}");
    }
    let export_options = ExportOptions {
        format,
        quality: cli.quality,
        ..ExportOptions::default()
    };
    let export = match encode(result, &export_options) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let path = if output.is_dir() {
        output.join(&export.filename)
    } else {
        output.to_path_buf()
    };
    if let Err(e) = std::fs::write(&path, &export.bytes) {
        eprintln!("error: cannot write {}: {e}", path.display());
        return ExitCode::FAILURE;
    }

    eprintln!(
        "Wrote {} ({options}, {}, {})",
        path.display(),
        export.format,
        format_file_size(export.bytes.len() as u64),
    );
    ExitCode::SUCCESS
}
