//! Quality-parameterized encoders for stored assets.
//!
//! This module provides:
//! - Lossy WebP encoding via libwebp (the default target format)
//! - Baseline JPEG encoding via the `image` crate
//!
//! Both encoders take RGB pixel data plus a quality in `1..=100` and are
//! deterministic: the same pixels at the same quality produce the same bytes.
//!
//! # Examples
//!
//! ```ignore
//! use assetpipe_core::config::TargetFormat;
//! use assetpipe_core::encode::encode_rgb;
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let webp_bytes = encode_rgb(TargetFormat::Webp, &pixels, 100, 100, 85).unwrap();
//! println!("Encoded {} bytes", webp_bytes.len());
//! ```

mod jpeg;
mod webp;

pub use jpeg::{encode_jpeg, JPEG_MAX_DIMENSION};
pub use self::webp::{encode_webp, WEBP_MAX_DIMENSION};

use thiserror::Error;

use crate::config::TargetFormat;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero or beyond what the format can represent
    #[error("Invalid dimensions for {format}: {width}x{height}")]
    InvalidDimensions {
        format: TargetFormat,
        width: u32,
        height: u32,
    },

    /// The codec rejected the input
    #[error("{format} encoding failed: {reason}")]
    EncodingFailed { format: TargetFormat, reason: String },
}

/// Encode RGB pixel data in the given target format.
pub fn encode_rgb(
    format: TargetFormat,
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    match format {
        TargetFormat::Webp => encode_webp(pixels, width, height, quality),
        TargetFormat::Jpeg => encode_jpeg(pixels, width, height, quality),
    }
}

/// Shared argument checks: non-zero dimensions and a tightly packed RGB buffer.
fn validate_rgb(
    format: TargetFormat,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions {
            format,
            width,
            height,
        });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
