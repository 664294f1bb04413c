//! Lossy WebP encoding via libwebp.
//!
//! The `image` crate only writes lossless WebP, which defeats the point of a
//! quality ladder, so this goes through the `webp` bindings instead.

use super::{validate_rgb, EncodeError};
use crate::config::TargetFormat;

/// Largest width or height a WebP bitstream can carry.
pub const WEBP_MAX_DIMENSION: u32 = 16_383;

/// Encode RGB pixel data to lossy WebP bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - Encoder quality (1-100); clamped
///
/// # Errors
///
/// * `EncodeError::InvalidDimensions` for zero or over-limit dimensions
/// * `EncodeError::InvalidPixelData` if the buffer is not `width * height * 3`
/// * `EncodeError::EncodingFailed` if libwebp rejects the picture
pub fn encode_webp(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate_rgb(TargetFormat::Webp, pixels, width, height)?;
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(EncodeError::InvalidDimensions {
            format: TargetFormat::Webp,
            width,
            height,
        });
    }

    let quality = f32::from(quality.clamp(1, 100));
    let encoded = ::webp::Encoder::from_rgb(pixels, width, height)
        .encode_simple(false, quality)
        .map_err(|e| EncodeError::EncodingFailed {
            format: TargetFormat::Webp,
            reason: format!("{e:?}"),
        })?;

    Ok(encoded.to_vec())
}
