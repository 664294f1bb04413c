//! Asset-class configuration.
//!
//! An [`AssetClass`] bundles everything the pipeline needs to know about one
//! category of uploaded image: canonical dimensions, output format, quality
//! ladder and size ceilings. Classes are plain configuration and are usually
//! loaded from TOML through [`PipelineConfig`]:
//!
//! ```toml
//! storage_root = "/srv/uploads"
//!
//! [classes.product]
//! folder = "products"
//! canonical_width = 800
//! canonical_height = 800
//! target_format = "webp"
//! quality_ladder = [85, 75, 65, 55, 50]
//! max_input_bytes = 10485760
//! max_output_bytes = 204800
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::{JPEG_MAX_DIMENSION, WEBP_MAX_DIMENSION};

/// 1 KiB.
const KIB: u64 = 1024;
/// 1 MiB.
const MIB: u64 = 1024 * 1024;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`PipelineConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No asset class is registered under the requested name.
    #[error("unknown asset class: {0}")]
    UnknownClass(String),

    /// An asset class failed validation.
    #[error("invalid asset class '{class}': {reason}")]
    InvalidClass { class: String, reason: String },

    /// A quality ladder failed validation.
    #[error("invalid quality ladder: {0}")]
    InvalidLadder(String),
}

/// Ordered encoder quality levels, highest first.
///
/// Guaranteed non-empty, strictly decreasing, and within `1..=100`. The last
/// entry is the quality floor: it is accepted even when the encoded output
/// still exceeds the size ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct QualityLadder(Vec<u8>);

impl QualityLadder {
    /// Build a ladder, validating ordering and range.
    pub fn new(levels: Vec<u8>) -> Result<Self, ConfigError> {
        if levels.is_empty() {
            return Err(ConfigError::InvalidLadder("ladder is empty".to_string()));
        }
        if let Some(&q) = levels.iter().find(|&&q| q == 0 || q > 100) {
            return Err(ConfigError::InvalidLadder(format!(
                "quality {q} is outside 1..=100"
            )));
        }
        if let Some(pair) = levels.windows(2).find(|w| w[0] <= w[1]) {
            return Err(ConfigError::InvalidLadder(format!(
                "levels must be strictly decreasing, found {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self(levels))
    }

    /// The quality levels, highest first.
    pub fn levels(&self) -> &[u8] {
        &self.0
    }

    /// The lowest quality, accepted unconditionally.
    pub fn floor(&self) -> u8 {
        // Non-empty by construction.
        self.0[self.0.len() - 1]
    }

    /// Every level except the floor, highest first.
    pub fn above_floor(&self) -> &[u8] {
        &self.0[..self.0.len() - 1]
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self(vec![85, 75, 65, 55, 50])
    }
}

impl TryFrom<Vec<u8>> for QualityLadder {
    type Error = ConfigError;

    fn try_from(levels: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(levels)
    }
}

impl From<QualityLadder> for Vec<u8> {
    fn from(ladder: QualityLadder) -> Self {
        ladder.0
    }
}

/// Output encoding for stored assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Lossy WebP (libwebp).
    #[default]
    Webp,
    /// Baseline JPEG.
    Jpeg,
}

impl TargetFormat {
    /// File extension used for stored assets of this format.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Webp => "webp",
            TargetFormat::Jpeg => "jpg",
        }
    }

    /// Largest width or height the encoder accepts.
    pub fn max_dimension(self) -> u32 {
        match self {
            TargetFormat::Webp => WEBP_MAX_DIMENSION,
            TargetFormat::Jpeg => JPEG_MAX_DIMENSION,
        }
    }

    /// MIME type served for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Webp => "image/webp",
            TargetFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetFormat::Webp => "webp",
            TargetFormat::Jpeg => "jpeg",
        })
    }
}

/// Interpolation filter for resizing.
///
/// Only anti-aliased filters are offered; nearest-neighbor produces visible
/// aliasing when downscaling photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Catmull-Rom cubic interpolation.
    CatmullRom,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Opaque color that transparent pixels are composited onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Background {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Background {
    pub const WHITE: Background = Background::new(255, 255, 255);
    pub const BLACK: Background = Background::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[u8; 3]> for Background {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Background> for [u8; 3] {
    fn from(bg: Background) -> Self {
        bg.to_array()
    }
}

fn default_max_input_dimension() -> u32 {
    16_384
}

/// Configuration bundle for one category of uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClass {
    /// Class name, e.g. "product". Filled from the registry key when loaded
    /// through [`PipelineConfig`].
    #[serde(default)]
    pub name: String,
    /// Storage folder (single path segment) under the storage root.
    pub folder: String,
    /// Canonical output width in pixels.
    pub canonical_width: u32,
    /// Canonical output height in pixels.
    pub canonical_height: u32,
    /// Output encoding.
    #[serde(default)]
    pub target_format: TargetFormat,
    /// Quality levels to try, highest first.
    #[serde(default)]
    pub quality_ladder: QualityLadder,
    /// Uploads larger than this are rejected before decoding.
    pub max_input_bytes: u64,
    /// Soft ceiling for the encoded output.
    pub max_output_bytes: u64,
    /// Background for flattening transparency.
    #[serde(default)]
    pub background: Background,
    /// Resize filter.
    #[serde(default)]
    pub filter: FilterType,
    /// Longest decoded edge accepted, guards against decompression bombs.
    #[serde(default = "default_max_input_dimension")]
    pub max_input_dimension: u32,
}

impl AssetClass {
    /// Square product photos: 800×800, 200 KiB target.
    pub fn product() -> Self {
        Self {
            name: "product".to_string(),
            folder: "products".to_string(),
            canonical_width: 800,
            canonical_height: 800,
            target_format: TargetFormat::Webp,
            quality_ladder: QualityLadder::default(),
            max_input_bytes: 10 * MIB,
            max_output_bytes: 200 * KIB,
            background: Background::WHITE,
            filter: FilterType::Lanczos3,
            max_input_dimension: default_max_input_dimension(),
        }
    }

    /// Landscape category banners: 600×400, 150 KiB target.
    pub fn category() -> Self {
        Self {
            name: "category".to_string(),
            folder: "categories".to_string(),
            canonical_width: 600,
            canonical_height: 400,
            max_output_bytes: 150 * KIB,
            ..Self::product()
        }
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidClass {
            class: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(invalid("canonical dimensions must be non-zero"));
        }
        let max = self.target_format.max_dimension();
        if self.canonical_width > max || self.canonical_height > max {
            return Err(invalid(&format!(
                "canonical dimensions exceed the {} limit of {max}px",
                self.target_format
            )));
        }
        if self.max_input_bytes == 0 {
            return Err(invalid("max_input_bytes must be non-zero"));
        }
        if self.max_output_bytes == 0 {
            return Err(invalid("max_output_bytes must be non-zero"));
        }
        if self.max_input_dimension == 0 {
            return Err(invalid("max_input_dimension must be non-zero"));
        }
        if !is_safe_segment(&self.folder) {
            return Err(invalid("folder must be a single relative path segment"));
        }
        Ok(())
    }
}

/// True if `segment` is usable as one path component under the storage root.
pub(crate) fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("uploads")
}

/// Storage root plus the registry of asset classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory that holds one sub-folder per asset class.
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
    /// Asset classes keyed by name.
    #[serde(default)]
    pub classes: BTreeMap<String, AssetClass>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let classes = [AssetClass::product(), AssetClass::category()]
            .into_iter()
            .map(|class| (class.name.clone(), class))
            .collect();
        Self {
            storage_root: default_storage_root(),
            classes,
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let mut config: PipelineConfig = toml::from_str(input)?;
        for (name, class) in config.classes.iter_mut() {
            class.name = name.clone();
            class.validate()?;
        }
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Look up an asset class by name.
    pub fn class(&self, name: &str) -> Result<&AssetClass, ConfigError> {
        self.classes
            .get(name)
            .ok_or_else(|| ConfigError::UnknownClass(name.to_string()))
    }
}
