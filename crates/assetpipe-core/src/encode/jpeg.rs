//! Baseline JPEG encoding.
//!
//! Used for asset classes whose consumers cannot display WebP. JPEG has no
//! alpha channel, which is fine: normalized rasters are always opaque.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;

use super::{validate_rgb, EncodeError};
use crate::config::TargetFormat;

/// Largest width or height a baseline JPEG frame header can carry.
pub const JPEG_MAX_DIMENSION: u32 = u16::MAX as u32;

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// Quality outside `1..=100` is clamped.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(TargetFormat::Jpeg, pixels, width, height)?;
    if width > JPEG_MAX_DIMENSION || height > JPEG_MAX_DIMENSION {
        return Err(EncodeError::InvalidDimensions {
            format: TargetFormat::Jpeg,
            width,
            height,
        });
    }

    let quality = quality.clamp(1, 100);
    let mut buffer = Vec::new();

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed {
            format: TargetFormat::Jpeg,
            reason: e.to_string(),
        })?;

    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
