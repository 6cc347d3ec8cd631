//! Command-line frontend for the Snapdoc export pipeline.
//!
//! `snapdoc export` runs the full pipeline against an image file (treated
//! as the export surface) or a built-in demo surface, and writes a
//! single-page PDF. `snapdoc bench` evaluates every compression preset
//! against the same surface and prints the ranked report.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use snapdoc_core::{
    benchmark_presets, export, BenchmarkReport, CaptureOptions, ExportOptions, ImageFormat,
    ImageSurface, Layer, LayeredSurface, PresetName, PresetOverrides, Rect, SurfaceRasterizer,
};

#[derive(Parser)]
#[command(name = "snapdoc", about = "Export a surface as a compressed single-page PDF")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the export pipeline and write a PDF.
    Export {
        /// Input image used as the export surface. Omit to use the
        /// built-in demo surface.
        input: Option<PathBuf>,

        /// Output PDF path.
        #[arg(short, long, default_value = "export.pdf")]
        output: PathBuf,

        /// Compression preset (high, medium, low, minimal, draft).
        #[arg(short, long, default_value = "medium")]
        preset: String,

        /// Override the preset's resolution multiplier.
        #[arg(long)]
        scale: Option<f32>,

        /// Override the preset's quality factor (0.0 - 1.0).
        #[arg(long)]
        quality: Option<f32>,

        /// Override the preset's target format (jpeg, png, webp).
        #[arg(long)]
        format: Option<String>,

        /// Capture timeout in milliseconds.
        #[arg(long, default_value_t = 15_000)]
        timeout_ms: u64,
    },

    /// Benchmark every preset against the surface and print the report.
    Bench {
        /// Input image used as the surface. Omit to use the demo surface.
        input: Option<PathBuf>,

        /// Capture timeout in milliseconds, applied per preset.
        #[arg(long, default_value_t = 15_000)]
        timeout_ms: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Export {
            input,
            output,
            preset,
            scale,
            quality,
            format,
            timeout_ms,
        } => {
            let surface = load_surface(input)?;
            let preset = PresetName::from_str(&preset)?;
            let format = format
                .as_deref()
                .map(ImageFormat::from_str)
                .transpose()
                .context("unrecognized format override")?;

            let options = ExportOptions {
                preset,
                overrides: PresetOverrides {
                    scale,
                    quality,
                    format,
                },
                timeout: Duration::from_millis(timeout_ms),
                ..ExportOptions::default()
            };

            let summary = export(surface.as_ref(), &output, &options)
                .with_context(|| format!("export to {} failed", output.display()))?;
            println!(
                "{}: {}x{} {:?}, image payload {}",
                output.display(),
                summary.width,
                summary.height,
                summary.orientation,
                summary.size.formatted
            );
        }

        Command::Bench { input, timeout_ms } => {
            let surface = load_surface(input)?;
            let defaults = CaptureOptions::default();
            let report = benchmark_presets(
                surface.as_ref(),
                defaults.background,
                Duration::from_millis(timeout_ms),
            );
            print_report(&report);
        }
    }

    Ok(())
}

/// Decode the input image as the surface, or build the demo surface.
fn load_surface(input: Option<PathBuf>) -> Result<Box<dyn SurfaceRasterizer>> {
    match input {
        Some(path) => {
            let image = image::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?
                .to_rgba8();
            log::info!(
                "loaded {} as a {}x{} surface",
                path.display(),
                image.width(),
                image.height()
            );
            Ok(Box::new(ImageSurface::new(image)))
        }
        None => Ok(Box::new(demo_surface())),
    }
}

/// A deterministic stand-in for a rendered report surface.
fn demo_surface() -> LayeredSurface {
    let mut surface = LayeredSurface::new(960, 540);
    surface
        .push_layer(Layer::opaque(Rect::new(40, 40, 880, 120), [31, 41, 55]))
        .push_layer(Layer::opaque(Rect::new(40, 200, 420, 300), [59, 130, 246]))
        .push_layer(Layer::opaque(Rect::new(500, 200, 420, 300), [16, 185, 129]))
        // Debug overlay, flagged out of exports.
        .push_layer(Layer::opaque(Rect::new(0, 0, 960, 30), [255, 0, 0]).excluded());
    surface
}

/// Print the benchmark report as a table plus the recommendation.
fn print_report(report: &BenchmarkReport) {
    println!(
        "{:<10} {:>12} {:>8} {:>7} {:>8}",
        "preset", "size", "ratio", "scale", "quality"
    );
    for entry in &report.entries {
        let size = entry
            .size
            .as_ref()
            .map(|s| s.formatted.clone())
            .or_else(|| entry.error.clone())
            .unwrap_or_default();
        let ratio = entry
            .compression_ratio
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{:<10} {:>12} {:>8} {:>6}x {:>8.2}",
            entry.preset.name.to_string(),
            size,
            ratio,
            entry.preset.scale,
            entry.preset.quality
        );
    }
    println!("\n{}", report.recommendation);
}
