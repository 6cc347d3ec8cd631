//! Output size estimation and formatting.
//!
//! Computes the byte length of an encoded payload without re-decoding it,
//! and renders human-readable sizes in binary (1024-based) units.

use serde::{Deserialize, Serialize};

use crate::encode::EncodedPayload;

/// Byte count of an encoded payload plus its human-readable rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeEstimate {
    /// Exact payload length in bytes.
    pub bytes: u64,
    /// Binary-unit rendering, e.g. `"1.50 KB"`.
    pub formatted: String,
}

impl SizeEstimate {
    fn from_bytes(bytes: u64) -> Self {
        Self {
            bytes,
            formatted: format_size(bytes),
        }
    }
}

/// Estimate the size of an encoded payload from its exact byte length.
///
/// Pure and idempotent: the same payload always yields the same estimate.
pub fn estimate(payload: &EncodedPayload) -> SizeEstimate {
    SizeEstimate::from_bytes(payload.bytes.len() as u64)
}

/// Estimate the decoded size of a base64 data-URL transport string.
///
/// Any `data:<mime>;base64,` header is stripped first. Base64 expands
/// every 3 payload bytes into 4 characters, so the true byte count is the
/// character count scaled by 3/4 (rounded), not the character count
/// itself.
pub fn estimate_data_url(data_url: &str) -> SizeEstimate {
    let body = match data_url.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => data_url,
    };
    let chars = body.len() as u64;
    SizeEstimate::from_bytes((chars * 3 + 2) / 4)
}

/// Format a byte count using binary units {Bytes, KB, MB, GB}.
///
/// Picks the largest unit whose integer part is at least 1. Values in KB
/// and above render with two decimals; plain byte counts render as
/// integers. Zero is exactly `"0 Bytes"`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut exponent = 0;
    let mut integral = bytes;
    while integral >= 1024 && exponent < UNITS.len() - 1 {
        integral /= 1024;
        exponent += 1;
    }
    if exponent == 0 {
        return format!("{} {}", bytes, UNITS[0]);
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{:.2} {}", value, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::ImageFormat;

    fn payload(len: usize) -> EncodedPayload {
        EncodedPayload {
            bytes: vec![0xAB; len],
            format: ImageFormat::Jpeg,
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_estimate_exact_length() {
        assert_eq!(estimate(&payload(12345)).bytes, 12345);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let p = payload(2048);

        let first = estimate(&p);
        let second = estimate(&p);
        assert_eq!(first, second);
        assert_eq!(first.formatted, "2.00 KB");
    }

    #[test]
    fn test_format_size_fixed_points() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
    }

    #[test]
    fn test_format_size_unit_selection() {
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1023), "1023 Bytes");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_size_caps_at_gb() {
        // Terabyte-scale values still render in GB.
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2048.00 GB");
    }

    #[test]
    fn test_data_url_estimate_matches_binary() {
        let p = payload(300);
        let url = p.to_data_url();

        // 300 bytes is a multiple of 3: no padding, exact inverse.
        assert_eq!(estimate_data_url(&url).bytes, 300);
    }

    #[test]
    fn test_data_url_estimate_without_header() {
        // 8 characters of bare base64 ~ 6 bytes.
        assert_eq!(estimate_data_url("AAAAAAAA").bytes, 6);
    }

    #[test]
    fn test_data_url_estimate_rounds_padding() {
        let p = payload(301);
        let url = p.to_data_url();

        // Padding inflates the estimate by at most the 3-byte block.
        let est = estimate_data_url(&url).bytes;
        assert!((301..=303).contains(&est));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: formatting is idempotent and never empty.
        #[test]
        fn prop_format_is_stable(bytes in 0u64..=u64::MAX / 2) {
            let first = format_size(bytes);
            let second = format_size(bytes);
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.is_empty());
        }

        /// Property: sub-KB values always format in Bytes, larger values
        /// never do.
        #[test]
        fn prop_unit_boundary(bytes in 1u64..=10_000_000) {
            let formatted = format_size(bytes);
            if bytes < 1024 {
                prop_assert!(formatted.ends_with(" Bytes"));
            } else {
                prop_assert!(!formatted.ends_with(" Bytes"));
            }
        }
    }
}
