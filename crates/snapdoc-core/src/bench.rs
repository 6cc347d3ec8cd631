//! Preset benchmarking.
//!
//! Runs the capture and encode stages under every catalog preset against
//! the same surface and compares the resulting payload sizes. Presets are
//! evaluated sequentially so at most one raster buffer is alive at a time,
//! and each preset's failure is isolated to its own report entry rather
//! than aborting the run.
//!
//! The tool returns a structured [`BenchmarkReport`]; deciding whether and
//! how to print it belongs to the presentation layer.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureOptions, SurfaceRasterizer};
use crate::encode::encode;
use crate::preset::{Preset, CATALOG};
use crate::size::{estimate, SizeEstimate};

const MIB: u64 = 1024 * 1024;

/// Advice derived from the largest successful preset output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Largest output exceeds 10 MiB: switch to the smallest presets.
    UseSmallestPresets,
    /// Largest output exceeds 5 MiB: prefer medium or low presets.
    UseMediumOrLow,
    /// Sizes are reasonable under every preset.
    AnyPreset,
}

impl Recommendation {
    fn from_largest(largest_bytes: Option<u64>) -> Self {
        match largest_bytes {
            Some(bytes) if bytes > 10 * MIB => Recommendation::UseSmallestPresets,
            Some(bytes) if bytes > 5 * MIB => Recommendation::UseMediumOrLow,
            _ => Recommendation::AnyPreset,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let advice = match self {
            Recommendation::UseSmallestPresets => {
                "Use the minimal or draft preset to reduce file size"
            }
            Recommendation::UseMediumOrLow => "Consider the medium or low preset",
            Recommendation::AnyPreset => "Current sizes are reasonable, any preset is acceptable",
        };
        write!(f, "{advice}")
    }
}

/// Outcome of evaluating one preset.
///
/// Exactly one of `size` and `error` is populated. `compression_ratio` is
/// the fractional size reduction relative to the largest successful entry
/// in the same run; it is omitted (not zeroed) when the run produced no
/// successful baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetReport {
    /// The preset this entry evaluated.
    pub preset: Preset,
    /// Payload size, present on success.
    pub size: Option<SizeEstimate>,
    /// Raster dimensions, present on success.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `(baseline - this) / baseline` against the largest success.
    pub compression_ratio: Option<f32>,
    /// Failure description, present when the preset failed.
    pub error: Option<String>,
}

/// Results for every catalog preset, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub entries: Vec<PresetReport>,
    pub recommendation: Recommendation,
}

impl BenchmarkReport {
    /// Entries that produced a payload.
    pub fn successes(&self) -> impl Iterator<Item = &PresetReport> {
        self.entries.iter().filter(|e| e.size.is_some())
    }

    /// The largest successful payload size, if any succeeded.
    pub fn largest_bytes(&self) -> Option<u64> {
        self.successes().filter_map(|e| e.size.as_ref()).map(|s| s.bytes).max()
    }
}

/// Evaluate every catalog preset against `surface`.
///
/// Runs capture + encode per preset (no packaging), sequentially; each
/// raster buffer is dropped before the next capture begins. A preset's
/// failure populates only that entry's `error` field.
pub fn benchmark_presets(
    surface: &dyn SurfaceRasterizer,
    background: [u8; 3],
    timeout: Duration,
) -> BenchmarkReport {
    let mut entries: Vec<PresetReport> = CATALOG
        .iter()
        .map(|&preset| run_preset(surface, preset, background, timeout))
        .collect();

    let baseline = entries
        .iter()
        .filter_map(|e| e.size.as_ref())
        .map(|s| s.bytes)
        .max();

    if let Some(baseline) = baseline {
        for entry in entries.iter_mut() {
            if let Some(size) = &entry.size {
                entry.compression_ratio =
                    Some((baseline - size.bytes) as f32 / baseline as f32);
            }
        }
    }

    BenchmarkReport {
        recommendation: Recommendation::from_largest(baseline),
        entries,
    }
}

fn run_preset(
    surface: &dyn SurfaceRasterizer,
    preset: Preset,
    background: [u8; 3],
    timeout: Duration,
) -> PresetReport {
    log::debug!("benchmarking preset {}", preset.name);
    let opts = CaptureOptions {
        scale: preset.scale,
        background,
        timeout,
    };

    let outcome = surface
        .capture(&opts)
        .map_err(|e| e.to_string())
        .and_then(|raster| {
            encode(&raster, preset.format, preset.quality, background).map_err(|e| e.to_string())
        });

    match outcome {
        Ok(payload) => PresetReport {
            preset,
            size: Some(estimate(&payload)),
            width: Some(payload.width),
            height: Some(payload.height),
            compression_ratio: None,
            error: None,
        },
        Err(message) => {
            log::warn!("preset {} failed: {message}", preset.name);
            PresetReport {
                preset,
                size: None,
                width: None,
                height: None,
                compression_ratio: None,
                error: Some(message),
            }
        }
    }
}
