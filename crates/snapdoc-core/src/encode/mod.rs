//! Image encoding pipeline.
//!
//! Converts a captured [`RasterBuffer`](crate::capture::RasterBuffer) into
//! a compressed byte stream under a quality factor in `[0, 1]`.
//!
//! # Format policy
//!
//! The pipeline optimizes for file size over format fidelity: a PNG
//! request is flattened onto the export background and encoded as JPEG
//! instead of honoring true lossless PNG. This substitution is deliberate
//! and externally observable - the returned payload reports the encoding
//! actually used, so callers must check [`EncodedPayload::format`] rather
//! than assume it matches the request. Call sites that require true PNG
//! must bypass this module.

mod jpeg;
mod webp;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::capture::RasterBuffer;
use crate::preset::ImageFormat;

/// Errors that can occur during image encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Quality factor outside `[0, 1]`.
    #[error("Quality must be within [0, 1], got {0}")]
    QualityOutOfRange(f32),

    /// The raster has no pixels to encode.
    #[error("Cannot encode empty raster ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },

    /// Pixel data length doesn't match the raster dimensions.
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// The underlying encoder failed.
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: ImageFormat,
        message: String,
    },
}

/// The compressed representation of a raster buffer.
///
/// `format` reflects the encoding actually produced, which for PNG
/// requests is [`ImageFormat::Jpeg`] under the substitution policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Compressed image bytes.
    pub bytes: Vec<u8>,
    /// Encoding actually used for `bytes`.
    pub format: ImageFormat,
    /// Source raster width in pixels.
    pub width: u32,
    /// Source raster height in pixels.
    pub height: u32,
}

impl EncodedPayload {
    /// Render the payload as a `data:` URL for text-safe transports.
    ///
    /// The base64 body is roughly 4/3 the size of the binary payload;
    /// [`crate::size::estimate_data_url`] reverses that expansion.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Encode a raster buffer into a compressed payload.
///
/// `quality` is a continuous compression knob in `[0, 1]`: 1.0 is
/// near-lossless and large, values toward 0.0 trade visible artifacts for
/// size. `background` is the opaque fill used when flattening transparency
/// away for JPEG output.
///
/// # Errors
///
/// [`EncodeError::QualityOutOfRange`] for quality outside `[0, 1]`,
/// [`EncodeError::EmptyRaster`] for a zero-area raster, and
/// [`EncodeError::EncodingFailed`] when the underlying encoder reports an
/// error.
pub fn encode(
    raster: &RasterBuffer,
    format: ImageFormat,
    quality: f32,
    background: [u8; 3],
) -> Result<EncodedPayload, EncodeError> {
    if !quality.is_finite() || !(0.0..=1.0).contains(&quality) {
        return Err(EncodeError::QualityOutOfRange(quality));
    }
    if raster.is_empty() {
        return Err(EncodeError::EmptyRaster {
            width: raster.width,
            height: raster.height,
        });
    }
    let expected = raster.pixel_count() * 4;
    if raster.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: raster.pixels.len(),
        });
    }

    let payload = match format {
        // JPEG cannot express transparency; flatten first.
        ImageFormat::Jpeg => jpeg::encode_flattened(raster, quality, background)?,
        // Size-over-fidelity policy: PNG requests are flattened and
        // re-encoded as JPEG (see module docs).
        ImageFormat::Png => {
            log::debug!("png requested, applying jpeg substitution policy");
            jpeg::encode_flattened(raster, quality, background)?
        }
        ImageFormat::Webp => webp::encode_lossy(raster, quality)?,
    };

    log::debug!(
        "encoded {}x{} raster as {} ({} bytes, quality {:.2})",
        payload.width,
        payload.height,
        payload.format,
        payload.bytes.len(),
        quality
    );
    Ok(payload)
}

#[cfg(test)]
pub(crate) fn gradient_raster(width: u32, height: u32) -> RasterBuffer {
    let mut pixels = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x * 7 + y * 3) % 256) as u8);
            pixels.push(((x * 13) % 256) as u8);
            pixels.push(((y * 11) % 256) as u8);
            pixels.push(255);
        }
    }
    RasterBuffer::from_rgba(width, height, pixels).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_basic() {
        let raster = gradient_raster(64, 48);

        let payload = encode(&raster, ImageFormat::Jpeg, 0.7, [0, 0, 0]).unwrap();
        assert_eq!(payload.format, ImageFormat::Jpeg);
        assert_eq!((payload.width, payload.height), (64, 48));
        assert!(!payload.bytes.is_empty());
        // JPEG SOI marker
        assert_eq!(&payload.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_png_request_yields_jpeg_payload() {
        let raster = gradient_raster(32, 32);

        let payload = encode(&raster, ImageFormat::Png, 0.7, [255, 255, 255]).unwrap();
        assert_eq!(payload.format, ImageFormat::Jpeg);
        assert_eq!(&payload.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_webp_basic() {
        let raster = gradient_raster(32, 32);

        let payload = encode(&raster, ImageFormat::Webp, 0.5, [0, 0, 0]).unwrap();
        assert_eq!(payload.format, ImageFormat::Webp);
        assert_eq!(&payload.bytes[0..4], b"RIFF");
        assert_eq!(&payload.bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_quality_monotonic_size() {
        let raster = gradient_raster(128, 96);

        let low = encode(&raster, ImageFormat::Jpeg, 0.2, [0, 0, 0]).unwrap();
        let high = encode(&raster, ImageFormat::Jpeg, 0.9, [0, 0, 0]).unwrap();
        assert!(low.bytes.len() <= high.bytes.len());
    }

    #[test]
    fn test_zero_area_raster_fails() {
        let raster = RasterBuffer {
            width: 0,
            height: 10,
            pixels: Vec::new(),
        };

        let err = encode(&raster, ImageFormat::Jpeg, 0.7, [0, 0, 0]).unwrap_err();
        assert!(matches!(err, EncodeError::EmptyRaster { .. }));
    }

    #[test]
    fn test_quality_out_of_range_fails() {
        let raster = gradient_raster(8, 8);

        for q in [-0.1, 1.1, f32::NAN] {
            let err = encode(&raster, ImageFormat::Jpeg, q, [0, 0, 0]).unwrap_err();
            assert!(matches!(err, EncodeError::QualityOutOfRange(_)));
        }
    }

    #[test]
    fn test_quality_bounds_are_valid() {
        let raster = gradient_raster(8, 8);

        assert!(encode(&raster, ImageFormat::Jpeg, 0.0, [0, 0, 0]).is_ok());
        assert!(encode(&raster, ImageFormat::Jpeg, 1.0, [0, 0, 0]).is_ok());
    }

    #[test]
    fn test_data_url_shape() {
        let raster = gradient_raster(8, 8);

        let payload = encode(&raster, ImageFormat::Jpeg, 0.7, [0, 0, 0]).unwrap();
        let url = payload.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        // 4 characters per 3 payload bytes, padded.
        let body = url.split(',').nth(1).unwrap();
        assert_eq!(body.len(), payload.bytes.len().div_ceil(3) * 4);
    }
}
