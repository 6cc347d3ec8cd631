//! Single-page document packaging.
//!
//! Wraps one encoded image into a PDF container whose only page is sized
//! exactly to the image's pixel dimensions - never a fixed paper size - so
//! the image sits at the origin with no margin and no scaling. Streams are
//! additionally compressed at the container level on top of the image's
//! own compression.

use std::io::Cursor;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::EncodedPayload;
use crate::preset::ImageFormat;

/// Errors that can occur while packaging or persisting a document.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// The payload's encoding cannot be embedded as a DCTDecode stream.
    #[error("Cannot package {0} payload; the container embeds JPEG only")]
    UnsupportedPayload(ImageFormat),

    /// The payload has no pixels.
    #[error("Cannot package empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Document assembly failed.
    #[error("Document assembly failed: {0}")]
    Assemble(String),

    /// Writing the artifact failed. Terminal; never retried.
    #[error("Failed to save document: {0}")]
    Save(#[from] std::io::Error),
}

/// Page orientation, derived from the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Landscape when width exceeds height, portrait otherwise.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// A fully assembled single-page document, ready to persist.
#[derive(Debug, Clone)]
pub struct PackagedDocument {
    /// The serialized PDF container.
    pub bytes: Vec<u8>,
    /// Page width in pixel units.
    pub width: u32,
    /// Page height in pixel units.
    pub height: u32,
    /// Derived page orientation.
    pub orientation: Orientation,
}

/// Package an encoded image into a single-page document.
///
/// The page's MediaBox is `[0 0 width height]` in pixel units and the
/// image is drawn over the full page from the origin. Only JPEG payloads
/// are accepted; the encoder's substitution policy guarantees the
/// orchestrated path always produces one.
///
/// # Errors
///
/// [`PackagingError::UnsupportedPayload`] for non-JPEG payloads,
/// [`PackagingError::EmptyImage`] for zero-area payloads, and
/// [`PackagingError::Assemble`] when serialization fails.
pub fn package(payload: &EncodedPayload) -> Result<PackagedDocument, PackagingError> {
    if payload.format != ImageFormat::Jpeg {
        return Err(PackagingError::UnsupportedPayload(payload.format));
    }
    if payload.width == 0 || payload.height == 0 {
        return Err(PackagingError::EmptyImage {
            width: payload.width,
            height: payload.height,
        });
    }

    let width = i64::from(payload.width);
    let height = i64::from(payload.height);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // JPEG bytes embed directly as a DCTDecode image XObject.
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        payload.bytes.clone(),
    ));

    // Scale the unit image square to the full page; origin, no margin.
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0i64.into(),
                    0i64.into(),
                    height.into(),
                    0i64.into(),
                    0i64.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded_content = content
        .encode()
        .map_err(|e| PackagingError::Assemble(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded_content));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    // Container-level stream compression on top of the image compression.
    doc.compress();

    let mut buffer = Cursor::new(Vec::new());
    doc.save_to(&mut buffer)
        .map_err(|e| PackagingError::Assemble(e.to_string()))?;

    Ok(PackagedDocument {
        bytes: buffer.into_inner(),
        width: payload.width,
        height: payload.height,
        orientation: Orientation::from_dimensions(payload.width, payload.height),
    })
}

/// Persist a packaged document under the caller-supplied filename.
///
/// This is the pipeline's terminal action. Failures are reported, never
/// retried.
pub fn save<P: AsRef<Path>>(document: &PackagedDocument, filename: P) -> Result<(), PackagingError> {
    std::fs::write(filename.as_ref(), &document.bytes)?;
    log::info!(
        "saved {} ({} bytes, {:?})",
        filename.as_ref().display(),
        document.bytes.len(),
        document.orientation
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RasterBuffer;
    use crate::encode::{encode, EncodedPayload};

    fn jpeg_payload(width: u32, height: u32) -> EncodedPayload {
        let raster = RasterBuffer::filled(width, height, [90, 120, 150, 255]);
        encode(&raster, ImageFormat::Jpeg, 0.8, [0, 0, 0]).unwrap()
    }

    #[test]
    fn test_package_single_page_exact_size() {
        let doc = package(&jpeg_payload(800, 600)).unwrap();
        assert_eq!((doc.width, doc.height), (800, 600));
        assert_eq!(doc.orientation, Orientation::Landscape);

        let parsed = lopdf::Document::load_mem(&doc.bytes).unwrap();
        let pages = parsed.get_pages();
        assert_eq!(pages.len(), 1);

        let page = parsed.get_dictionary(pages[&1]).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let coords: Vec<i64> = media_box.iter().map(|o| o.as_i64().unwrap()).collect();
        assert_eq!(coords, vec![0, 0, 800, 600]);
    }

    #[test]
    fn test_orientation_derivation() {
        assert_eq!(
            Orientation::from_dimensions(800, 600),
            Orientation::Landscape
        );
        assert_eq!(
            Orientation::from_dimensions(600, 800),
            Orientation::Portrait
        );
        // Square pages are portrait.
        assert_eq!(
            Orientation::from_dimensions(500, 500),
            Orientation::Portrait
        );
    }

    #[test]
    fn test_package_starts_with_pdf_header() {
        let doc = package(&jpeg_payload(10, 20)).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(doc.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_package_rejects_non_jpeg() {
        let raster = RasterBuffer::filled(16, 16, [1, 2, 3, 255]);
        let payload = encode(&raster, ImageFormat::Webp, 0.5, [0, 0, 0]).unwrap();

        let err = package(&payload).unwrap_err();
        assert!(matches!(
            err,
            PackagingError::UnsupportedPayload(ImageFormat::Webp)
        ));
    }

    #[test]
    fn test_package_rejects_empty_image() {
        let payload = EncodedPayload {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            format: ImageFormat::Jpeg,
            width: 0,
            height: 0,
        };

        let err = package(&payload).unwrap_err();
        assert!(matches!(err, PackagingError::EmptyImage { .. }));
    }

    #[test]
    fn test_save_writes_file() {
        let dir = std::env::temp_dir().join("snapdoc-pdf-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.pdf");

        let doc = package(&jpeg_payload(32, 32)).unwrap();
        save(&doc, &path).unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, doc.bytes);
        std::fs::remove_file(&path).unwrap();
    }
}
