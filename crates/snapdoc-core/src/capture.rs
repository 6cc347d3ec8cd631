//! Surface rasterization.
//!
//! Captures a rectangular visual surface into an RGBA pixel buffer at a
//! chosen resolution multiplier. The rest of the pipeline depends only on
//! the [`RasterBuffer`] shape, never on how a concrete surface renders, so
//! platform rasterizers plug in behind the [`SurfaceRasterizer`] trait.
//!
//! Two implementations ship with the crate:
//!
//! - [`LayeredSurface`] - a stack of solid-color rectangles over a base
//!   size, used by tests and the demo path.
//! - [`ImageSurface`] - wraps an already-decoded image, used by the CLI to
//!   treat an image file as the export surface.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Default capture timeout, matching the pipeline's historical 15 s limit.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Default background fill for uncovered surface regions (dark slate).
pub const DEFAULT_BACKGROUND: [u8; 3] = [0x11, 0x18, 0x27];

/// Errors that can occur while rasterizing a surface.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The surface has no area to capture.
    #[error("Cannot capture empty surface ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    /// The resolution multiplier is zero, negative, or not finite.
    #[error("Invalid resolution multiplier: {0}")]
    InvalidScale(f32),

    /// Rasterization exceeded the configured deadline.
    #[error("Capture timed out after {0} ms")]
    Timeout(u64),

    /// The surface failed to render.
    #[error("Capture failed: {0}")]
    RenderFailed(String),
}

/// Configuration for a single capture call.
///
/// Always passed explicitly; no component reads ambient defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Resolution multiplier applied to both surface dimensions. Output
    /// pixel count scales quadratically with this value.
    pub scale: f32,
    /// Opaque RGB fill for regions the surface does not cover.
    pub background: [u8; 3],
    /// Deadline for the whole capture.
    pub timeout: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: DEFAULT_BACKGROUND,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CaptureOptions {
    /// Options with the given multiplier and default background/timeout.
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }
}

/// An RGBA8 pixel grid produced by capturing a surface.
///
/// Produced fresh per capture call, owned exclusively by that call's
/// pipeline, and discarded after encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Allocate a buffer filled with a uniform RGBA color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Build a buffer from raw RGBA bytes. Returns `None` when the data
    /// length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Number of pixels in the buffer.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Composite the buffer over an opaque background, dropping alpha.
    ///
    /// Returns RGB data (3 bytes per pixel). Used before encoding into
    /// formats that cannot express transparency.
    pub fn flatten_onto(&self, background: [u8; 3]) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() * 3);
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as u16;
            for c in 0..3 {
                let src = px[c] as u16;
                let bg = background[c] as u16;
                rgb.push(((src * a + bg * (255 - a)) / 255) as u8);
            }
        }
        rgb
    }
}

/// Capability interface for capturing a surface into pixels.
///
/// Implementations render whatever region they were constructed over,
/// honoring the multiplier, background, and timeout in `opts`. Elements
/// the surface flags as excluded from export must not appear in the
/// output, and sub-resources that cannot be read are included best-effort
/// rather than failing the whole capture. Implementations must clean up
/// any scratch state they create before returning, on success or failure.
/// Callers must not run concurrent captures against the same live
/// external surface; the built-in surfaces here are immutable and safe to
/// share.
pub trait SurfaceRasterizer {
    /// Rasterize the surface.
    ///
    /// # Errors
    ///
    /// [`CaptureError::EmptySurface`] for a zero-area surface,
    /// [`CaptureError::Timeout`] when the deadline elapses mid-render, and
    /// [`CaptureError::InvalidScale`] for a non-positive multiplier.
    fn capture(&self, opts: &CaptureOptions) -> Result<RasterBuffer, CaptureError>;
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One solid-color element of a [`LayeredSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    /// Position and size in unscaled surface coordinates.
    pub rect: Rect,
    /// RGBA fill color, composited over whatever is below.
    pub color: [u8; 4],
    /// When set, the layer is omitted from every capture.
    pub export_excluded: bool,
}

impl Layer {
    /// An opaque layer included in exports.
    pub fn opaque(rect: Rect, rgb: [u8; 3]) -> Self {
        Self {
            rect,
            color: [rgb[0], rgb[1], rgb[2], 255],
            export_excluded: false,
        }
    }

    /// Mark the layer as excluded from export.
    pub fn excluded(mut self) -> Self {
        self.export_excluded = true;
        self
    }
}

/// A deterministic software surface: a base area with a stack of
/// solid-color rectangles painted back-to-front.
#[derive(Debug, Clone, Default)]
pub struct LayeredSurface {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl LayeredSurface {
    /// A surface of the given unscaled size with no layers.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    /// Append a layer on top of the current stack.
    pub fn push_layer(&mut self, layer: Layer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    /// Unscaled surface dimensions.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Scale a surface coordinate, keeping at least one pixel.
fn scaled(value: u32, scale: f32) -> u32 {
    ((value as f32 * scale).round() as u32).max(1)
}

impl SurfaceRasterizer for LayeredSurface {
    fn capture(&self, opts: &CaptureOptions) -> Result<RasterBuffer, CaptureError> {
        if !opts.scale.is_finite() || opts.scale <= 0.0 {
            return Err(CaptureError::InvalidScale(opts.scale));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::EmptySurface {
                width: self.width,
                height: self.height,
            });
        }

        let deadline = Instant::now() + opts.timeout;
        let timed_out = || Instant::now() >= deadline;
        let timeout_ms = opts.timeout.as_millis() as u64;

        let out_w = scaled(self.width, opts.scale);
        let out_h = scaled(self.height, opts.scale);
        let bg = opts.background;
        let mut raster = RasterBuffer::filled(out_w, out_h, [bg[0], bg[1], bg[2], 255]);

        for layer in &self.layers {
            if timed_out() {
                return Err(CaptureError::Timeout(timeout_ms));
            }
            if layer.export_excluded {
                continue;
            }
            blend_rect(&mut raster, layer.rect, layer.color, opts.scale);
        }

        log::debug!(
            "captured {}x{} surface at {}x -> {}x{} raster",
            self.width,
            self.height,
            opts.scale,
            out_w,
            out_h
        );
        Ok(raster)
    }
}

/// Composite a scaled rectangle of `color` over the raster.
fn blend_rect(raster: &mut RasterBuffer, rect: Rect, color: [u8; 4], scale: f32) {
    let x0 = ((rect.x as f32 * scale).round() as u32).min(raster.width);
    let y0 = ((rect.y as f32 * scale).round() as u32).min(raster.height);
    let x1 = (((rect.x + rect.width) as f32 * scale).round() as u32).min(raster.width);
    let y1 = (((rect.y + rect.height) as f32 * scale).round() as u32).min(raster.height);

    let a = color[3] as u16;
    for y in y0..y1 {
        let row = (y as usize) * (raster.width as usize);
        for x in x0..x1 {
            let i = (row + x as usize) * 4;
            let px = &mut raster.pixels[i..i + 4];
            for c in 0..3 {
                let src = color[c] as u16;
                let dst = px[c] as u16;
                px[c] = ((src * a + dst * (255 - a)) / 255) as u8;
            }
            // Compositing over an opaque base keeps the result opaque.
            px[3] = px[3].max(color[3]);
        }
    }
}

/// A surface backed by an already-decoded RGBA image.
///
/// The multiplier resizes the image with Lanczos3 interpolation, so a
/// capture at scale 1.0 reproduces the source pixels exactly.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: image::RgbaImage,
}

impl ImageSurface {
    pub fn new(image: image::RgbaImage) -> Self {
        Self { image }
    }

    /// Source dimensions before scaling.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl SurfaceRasterizer for ImageSurface {
    fn capture(&self, opts: &CaptureOptions) -> Result<RasterBuffer, CaptureError> {
        if !opts.scale.is_finite() || opts.scale <= 0.0 {
            return Err(CaptureError::InvalidScale(opts.scale));
        }
        let (src_w, src_h) = self.image.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(CaptureError::EmptySurface {
                width: src_w,
                height: src_h,
            });
        }

        let start = Instant::now();
        let out_w = scaled(src_w, opts.scale);
        let out_h = scaled(src_h, opts.scale);

        let pixels = if out_w == src_w && out_h == src_h {
            self.image.as_raw().clone()
        } else {
            image::imageops::resize(
                &self.image,
                out_w,
                out_h,
                image::imageops::FilterType::Lanczos3,
            )
            .into_raw()
        };

        if start.elapsed() >= opts.timeout {
            return Err(CaptureError::Timeout(opts.timeout.as_millis() as u64));
        }

        RasterBuffer::from_rgba(out_w, out_h, pixels).ok_or_else(|| {
            CaptureError::RenderFailed("resized pixel data has unexpected length".to_string())
        })
    }
}
