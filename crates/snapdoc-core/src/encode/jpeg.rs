//! JPEG encoding for export.
//!
//! Uses the `image` crate's JPEG encoder. Because JPEG has no alpha
//! channel, the raster is composited over the export background before
//! encoding.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;

use super::{EncodeError, EncodedPayload};
use crate::capture::RasterBuffer;
use crate::preset::ImageFormat;

/// Map the pipeline's `[0, 1]` quality factor onto the encoder's 1-100
/// scale. Quality 0.0 still maps to 1 (maximal compression, not an error).
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Flatten a raster onto an opaque background and encode it as JPEG.
///
/// The caller validates quality range and raster dimensions; this function
/// only fails when the underlying encoder does.
pub(super) fn encode_flattened(
    raster: &RasterBuffer,
    quality: f32,
    background: [u8; 3],
) -> Result<EncodedPayload, EncodeError> {
    let rgb = raster.flatten_onto(background);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality));
    encoder
        .write_image(&rgb, raster.width, raster.height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: ImageFormat::Jpeg,
            message: e.to_string(),
        })?;

    Ok(EncodedPayload {
        bytes: buffer.into_inner(),
        format: ImageFormat::Jpeg,
        width: raster.width,
        height: raster.height,
    })
}
