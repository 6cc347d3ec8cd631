//! Compression preset catalog.
//!
//! A preset bundles the three knobs of the export pipeline: the resolution
//! multiplier applied during capture, the encoder quality factor, and the
//! target image format. The catalog is fixed at compile time; nothing
//! mutates it at runtime, and every pipeline stage receives a fully
//! resolved [`Preset`] value rather than reading ambient defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a preset name does not match any catalog entry.
#[derive(Debug, Error)]
#[error("Unknown preset: {0}")]
pub struct UnknownPresetError(pub String);

/// Error returned when a format name is not one of jpeg/png/webp.
#[derive(Debug, Error)]
#[error("Unknown image format: {0}")]
pub struct UnknownFormatError(pub String);

/// Target image encoding for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Lossy JPEG. The only format the document packager embeds directly.
    Jpeg,
    /// PNG request. Re-encoded as JPEG by the encoder's substitution
    /// policy; see [`crate::encode`].
    Png,
    /// Lossy WebP.
    Webp,
}

impl ImageFormat {
    /// MIME type of the encoding.
    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ImageFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            "webp" => Ok(ImageFormat::Webp),
            other => Err(UnknownFormatError(other.to_string())),
        }
    }
}

/// Names of the registered compression presets, largest output first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresetName {
    /// 2.0x resolution, quality 0.9. Largest files.
    High,
    /// 1.5x resolution, quality 0.7. The default trade-off.
    #[default]
    Medium,
    /// 1.2x resolution, quality 0.5.
    Low,
    /// 1.0x resolution, quality 0.3. Smallest files at native resolution.
    Minimal,
    /// 0.8x resolution, quality 0.2. Sub-native draft output.
    Draft,
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresetName::High => "high",
            PresetName::Medium => "medium",
            PresetName::Low => "low",
            PresetName::Minimal => "minimal",
            PresetName::Draft => "draft",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PresetName {
    type Err = UnknownPresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(PresetName::High),
            "medium" => Ok(PresetName::Medium),
            "low" => Ok(PresetName::Low),
            "minimal" => Ok(PresetName::Minimal),
            "draft" => Ok(PresetName::Draft),
            other => Err(UnknownPresetError(other.to_string())),
        }
    }
}

/// A fully resolved compression preset.
///
/// Immutable once resolved. The catalog guarantees `scale > 0` and
/// `quality` in `[0, 1]`, and orders entries so that `scale * quality`
/// strictly decreases from [`PresetName::High`] down to
/// [`PresetName::Draft`], which makes output size ordering monotonic on a
/// fixed surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Catalog identifier.
    pub name: PresetName,
    /// Resolution multiplier applied to both surface dimensions.
    pub scale: f32,
    /// Encoder quality factor in `[0, 1]`.
    pub quality: f32,
    /// Target encoding.
    pub format: ImageFormat,
}

/// The fixed preset catalog, largest output first.
pub const CATALOG: [Preset; 5] = [
    Preset {
        name: PresetName::High,
        scale: 2.0,
        quality: 0.9,
        format: ImageFormat::Jpeg,
    },
    Preset {
        name: PresetName::Medium,
        scale: 1.5,
        quality: 0.7,
        format: ImageFormat::Jpeg,
    },
    Preset {
        name: PresetName::Low,
        scale: 1.2,
        quality: 0.5,
        format: ImageFormat::Jpeg,
    },
    Preset {
        name: PresetName::Minimal,
        scale: 1.0,
        quality: 0.3,
        format: ImageFormat::Jpeg,
    },
    Preset {
        name: PresetName::Draft,
        scale: 0.8,
        quality: 0.2,
        format: ImageFormat::Jpeg,
    },
];

impl Default for Preset {
    fn default() -> Self {
        Preset::resolve(PresetName::default())
    }
}

impl Preset {
    /// Look up the catalog entry for `name`.
    pub fn resolve(name: PresetName) -> Preset {
        // The catalog covers every PresetName variant.
        CATALOG
            .iter()
            .copied()
            .find(|p| p.name == name)
            .unwrap_or_else(|| unreachable!("catalog misses preset {name}"))
    }

    /// Look up a catalog entry by its string name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPresetError`] if `name` is not a registered
    /// identifier.
    pub fn resolve_str(name: &str) -> Result<Preset, UnknownPresetError> {
        Ok(Preset::resolve(name.parse()?))
    }

    /// Return a copy with individual fields replaced by `overrides`.
    pub fn with_overrides(self, overrides: &PresetOverrides) -> Preset {
        Preset {
            name: self.name,
            scale: overrides.scale.unwrap_or(self.scale),
            quality: overrides.quality.unwrap_or(self.quality),
            format: overrides.format.unwrap_or(self.format),
        }
    }
}

/// Optional per-export replacements for individual preset fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetOverrides {
    /// Replace the resolution multiplier.
    pub scale: Option<f32>,
    /// Replace the quality factor.
    pub quality: Option<f32>,
    /// Replace the target format.
    pub format: Option<ImageFormat>,
}

impl PresetOverrides {
    /// Overrides that leave the preset untouched.
    pub fn none() -> Self {
        Self::default()
    }
}
