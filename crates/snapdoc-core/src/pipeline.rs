//! Export pipeline orchestration.
//!
//! Composes the pipeline stages in order: resolve preset, capture the
//! surface, encode the raster, package the payload, save the artifact.
//! Every stage failure aborts the pipeline and propagates unmodified; the
//! packager only runs after a fully successful encode, so no partial file
//! is ever written.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{
    CaptureError, CaptureOptions, SurfaceRasterizer, DEFAULT_BACKGROUND, DEFAULT_TIMEOUT,
};
use crate::encode::{encode, EncodeError};
use crate::pdf::{package, save, Orientation, PackagedDocument, PackagingError};
use crate::preset::{Preset, PresetName, PresetOverrides, UnknownPresetError};
use crate::size::{estimate, SizeEstimate};

/// Any failure along the export pipeline, by stage.
///
/// The orchestrator does not catch or downgrade stage errors; callers own
/// user-visible messaging and may re-initiate a failed export as a fresh
/// invocation.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Preset(#[from] UnknownPresetError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

/// Configuration for one export call.
///
/// Fully explicit: the resolved preset and these options are the only
/// inputs the lower stages see, there are no ambient defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Catalog preset to resolve. Defaults to [`PresetName::Medium`].
    pub preset: PresetName,
    /// Per-call replacements for individual preset fields.
    pub overrides: PresetOverrides,
    /// Opaque fill behind transparent surface regions.
    pub background: [u8; 3],
    /// Capture deadline.
    pub timeout: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            preset: PresetName::default(),
            overrides: PresetOverrides::none(),
            background: DEFAULT_BACKGROUND,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExportOptions {
    /// Options for a named catalog preset with no overrides.
    pub fn preset(name: PresetName) -> Self {
        Self {
            preset: name,
            ..Self::default()
        }
    }
}

/// What an export produced, for caller-side reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// The fully resolved preset the pipeline ran under.
    pub preset: Preset,
    /// Size of the embedded image payload.
    pub size: SizeEstimate,
    /// Raster dimensions, which equal the page dimensions.
    pub width: u32,
    pub height: u32,
    /// Derived page orientation.
    pub orientation: Orientation,
}

/// Run the full pipeline and persist the artifact under `filename`.
///
/// `filename` is used verbatim as the artifact's name. Saving is the
/// terminal stage; it is only reached after packaging succeeded, and its
/// failures are reported rather than retried.
pub fn export<P: AsRef<Path>>(
    surface: &dyn SurfaceRasterizer,
    filename: P,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let (document, summary) = assemble(surface, options)?;
    save(&document, filename)?;
    Ok(summary)
}

/// Run the pipeline up to packaging and return the document bytes instead
/// of touching the filesystem.
pub fn export_to_vec(
    surface: &dyn SurfaceRasterizer,
    options: &ExportOptions,
) -> Result<(Vec<u8>, ExportSummary), ExportError> {
    let (document, summary) = assemble(surface, options)?;
    Ok((document.bytes, summary))
}

/// Resolve a preset by string name and run the full pipeline.
///
/// # Errors
///
/// [`UnknownPresetError`] (wrapped in [`ExportError::Preset`]) when `name`
/// is not a registered identifier, in addition to the stage errors of
/// [`export`].
pub fn export_named<P: AsRef<Path>>(
    surface: &dyn SurfaceRasterizer,
    filename: P,
    name: &str,
    overrides: PresetOverrides,
) -> Result<ExportSummary, ExportError> {
    let preset = Preset::resolve_str(name)?;
    let options = ExportOptions {
        preset: preset.name,
        overrides,
        ..ExportOptions::default()
    };
    export(surface, filename, &options)
}

fn assemble(
    surface: &dyn SurfaceRasterizer,
    options: &ExportOptions,
) -> Result<(PackagedDocument, ExportSummary), ExportError> {
    let preset = Preset::resolve(options.preset).with_overrides(&options.overrides);
    log::debug!(
        "export starting: preset {} (scale {}, quality {}, format {})",
        preset.name,
        preset.scale,
        preset.quality,
        preset.format
    );

    let capture_opts = CaptureOptions {
        scale: preset.scale,
        background: options.background,
        timeout: options.timeout,
    };
    let raster = surface.capture(&capture_opts)?;

    let payload = encode(&raster, preset.format, preset.quality, options.background)?;
    // The raster is no longer needed once encoded.
    drop(raster);

    let size = estimate(&payload);
    let document = package(&payload)?;

    let summary = ExportSummary {
        preset,
        size,
        width: document.width,
        height: document.height,
        orientation: document.orientation,
    };
    log::info!(
        "export assembled: {}x{} {} -> {}",
        summary.width,
        summary.height,
        summary.preset.name,
        summary.size.formatted
    );
    Ok((document, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Layer, LayeredSurface, RasterBuffer, Rect};
    use crate::preset::ImageFormat;

    fn demo_surface() -> LayeredSurface {
        let mut surface = LayeredSurface::new(200, 120);
        surface
            .push_layer(Layer::opaque(Rect::new(10, 10, 80, 40), [220, 60, 60]))
            .push_layer(Layer::opaque(Rect::new(50, 30, 120, 70), [60, 120, 220]));
        surface
    }

    #[test]
    fn test_export_to_vec_default_preset() {
        let surface = demo_surface();

        let (bytes, summary) = export_to_vec(&surface, &ExportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(summary.preset.name, PresetName::Medium);
        // 200x120 at 1.5x
        assert_eq!((summary.width, summary.height), (300, 180));
        assert_eq!(summary.orientation, Orientation::Landscape);
        assert!(summary.size.bytes > 0);
    }

    #[test]
    fn test_export_overrides_scale() {
        let surface = demo_surface();
        let options = ExportOptions {
            overrides: PresetOverrides {
                scale: Some(1.0),
                ..PresetOverrides::none()
            },
            ..ExportOptions::default()
        };

        let (_, summary) = export_to_vec(&surface, &options).unwrap();
        assert_eq!((summary.width, summary.height), (200, 120));
        // Quality keeps the preset's value.
        assert_eq!(summary.preset.quality, 0.7);
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = std::env::temp_dir().join("snapdoc-pipeline-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.pdf");

        let surface = demo_surface();
        let summary =
            export_named(&surface, &path, "minimal", PresetOverrides::none()).unwrap();
        assert_eq!(summary.preset.name, PresetName::Minimal);
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_export_named_unknown_preset() {
        let surface = demo_surface();

        let err = export_named(&surface, "unused.pdf", "bogus", PresetOverrides::none())
            .unwrap_err();
        assert!(matches!(err, ExportError::Preset(_)));
    }

    #[test]
    fn test_capture_failure_aborts_before_save() {
        let dir = std::env::temp_dir().join("snapdoc-pipeline-abort");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("never.pdf");
        let _ = std::fs::remove_file(&path);

        let surface = LayeredSurface::new(0, 0);
        let err = export(&surface, &path, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::Capture(_)));
        // No partial file.
        assert!(!path.exists());
    }

    #[test]
    fn test_timeout_propagates_as_capture_error() {
        let surface = demo_surface();
        let options = ExportOptions {
            timeout: Duration::ZERO,
            ..ExportOptions::default()
        };

        let err = export_to_vec(&surface, &options).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Capture(CaptureError::Timeout(_))
        ));
    }

    #[test]
    fn test_webp_override_surfaces_packaging_error() {
        let surface = demo_surface();
        let options = ExportOptions {
            overrides: PresetOverrides {
                format: Some(ImageFormat::Webp),
                ..PresetOverrides::none()
            },
            ..ExportOptions::default()
        };

        let err = export_to_vec(&surface, &options).unwrap_err();
        assert!(matches!(err, ExportError::Packaging(_)));
    }

    #[test]
    fn test_round_trip_800_600_landscape() {
        // Classic scenario: an 800x600 raster must produce a document with
        // exactly one 800x600 landscape page.
        let raster = RasterBuffer::filled(800, 600, [10, 20, 30, 255]);
        let payload = encode(&raster, ImageFormat::Jpeg, 0.7, [0, 0, 0]).unwrap();
        let document = package(&payload).unwrap();

        assert_eq!((document.width, document.height), (800, 600));
        assert_eq!(document.orientation, Orientation::Landscape);
    }
}
