//! Core types for upload decoding.

use std::fmt;

use image::{ColorType, DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Orientation;

/// Error types for upload decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The declared extension is not on the whitelist.
    #[error("Unsupported extension: {0:?}")]
    UnsupportedExtension(String),

    /// The byte signature names a format we do not accept.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image file is corrupted, truncated, or not an image at all.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The image exceeds the decoder's dimension or allocation limits.
    #[error("Image exceeds decode limits: {0}")]
    LimitsExceeded(String),

    /// The image decoded to a raster with no pixels.
    #[error("Decoded image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
    Webp,
}

impl SourceFormat {
    /// Every accepted format.
    pub const ALL: [SourceFormat; 3] = [SourceFormat::Jpeg, SourceFormat::Png, SourceFormat::Webp];

    /// Resolve a declared extension against the whitelist.
    ///
    /// Matching is case-insensitive and tolerates a leading dot.
    pub fn from_extension(extension: &str) -> Result<Self, DecodeError> {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "jpg" | "jpeg" => Ok(SourceFormat::Jpeg),
            "png" => Ok(SourceFormat::Png),
            "webp" => Ok(SourceFormat::Webp),
            _ => Err(DecodeError::UnsupportedExtension(extension.to_string())),
        }
    }

    /// Map a sniffed image crate format onto the whitelist.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
            ImageFormat::Png => Some(SourceFormat::Png),
            ImageFormat::WebP => Some(SourceFormat::Webp),
            _ => None,
        }
    }

    /// Convert to the image crate's format.
    pub fn to_image_format(self) -> ImageFormat {
        match self {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Png => "png",
            SourceFormat::Webp => "webp",
        })
    }
}

/// A decoded upload, upright and ready for normalization.
///
/// Keeps the image crate's native channel layout so the normalizer can tell
/// whether there is transparency to flatten.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    format: SourceFormat,
    orientation: Orientation,
}

impl DecodedImage {
    /// Wrap a decoded raster. Rejects rasters with a zero dimension.
    pub fn new(
        image: DynamicImage,
        format: SourceFormat,
        orientation: Orientation,
    ) -> Result<Self, DecodeError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DecodeError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Self {
            image,
            format,
            orientation,
        })
    }

    /// Width in pixels, after orientation correction.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels, after orientation correction.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Native channel layout of the source.
    pub fn color(&self) -> ColorType {
        self.image.color()
    }

    /// Whether the source carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    /// The format the bytes were decoded as.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// The EXIF orientation that was applied while decoding.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The upright raster.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Take ownership of the raster, dropping the metadata.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}
