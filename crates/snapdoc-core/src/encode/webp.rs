//! Lossy WebP encoding.
//!
//! The `image` crate only ships a lossless WebP encoder, so the quality
//! knob goes through the `webp` crate (libwebp bindings) instead. WebP
//! keeps the alpha channel; no flattening happens on this path.

use super::{EncodeError, EncodedPayload};
use crate::capture::RasterBuffer;
use crate::preset::ImageFormat;

/// Encode a raster as lossy WebP at the given `[0, 1]` quality factor.
pub(super) fn encode_lossy(
    raster: &RasterBuffer,
    quality: f32,
) -> Result<EncodedPayload, EncodeError> {
    let encoder = webp::Encoder::from_rgba(&raster.pixels, raster.width, raster.height);

    let mut config = webp::WebPConfig::new().map_err(|_| EncodeError::EncodingFailed {
        format: ImageFormat::Webp,
        message: "failed to create WebP config".to_string(),
    })?;
    config.lossless = 0;
    config.quality = quality * 100.0;

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| EncodeError::EncodingFailed {
            format: ImageFormat::Webp,
            message: format!("{e:?}"),
        })?;

    Ok(EncodedPayload {
        bytes: memory.to_vec(),
        format: ImageFormat::Webp,
        width: raster.width,
        height: raster.height,
    })
}
