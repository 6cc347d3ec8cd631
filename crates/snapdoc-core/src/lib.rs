//! Snapdoc Core - export compression pipeline
//!
//! This crate turns a captured visual surface into a size-bounded,
//! single-page PDF: it rasterizes the surface under a resolution
//! multiplier, re-encodes the raster as a compressed image under a named
//! quality preset, and packages the image into a page sized exactly to
//! the raster. A benchmark tool evaluates every preset against the same
//! surface and reports ranked sizes.
//!
//! Pipeline order: preset -> capture -> encode -> package -> save.
//!
//! All state lives within a single export or benchmark invocation. The
//! preset catalog is the only shared object and it is read-only, so
//! independent exports may run concurrently as long as they do not share
//! one live external surface.

pub mod bench;
pub mod capture;
pub mod encode;
pub mod pdf;
pub mod pipeline;
pub mod preset;
pub mod size;

pub use bench::{benchmark_presets, BenchmarkReport, PresetReport, Recommendation};
pub use capture::{
    CaptureError, CaptureOptions, ImageSurface, Layer, LayeredSurface, RasterBuffer, Rect,
    SurfaceRasterizer,
};
pub use encode::{encode, EncodeError, EncodedPayload};
pub use pdf::{package, save, Orientation, PackagedDocument, PackagingError};
pub use pipeline::{
    export, export_named, export_to_vec, ExportError, ExportOptions, ExportSummary,
};
pub use preset::{
    ImageFormat, Preset, PresetName, PresetOverrides, UnknownFormatError, UnknownPresetError,
    CATALOG,
};
pub use size::{estimate, estimate_data_url, format_size, SizeEstimate};
