//! Size-bounded compression over a quality ladder.
//!
//! The ladder is walked highest quality first and the first level whose output
//! fits the ceiling wins. If nothing fits, the floor's output is accepted: the
//! ceiling is a soft target, and an oversized asset is preferable to
//! rejecting a valid upload.
//!
//! The search is split from the codec so the two stopping conditions (fits,
//! ladder exhausted) can be tested without encoding real images.

use crate::config::{AssetClass, QualityLadder};
use crate::encode::{encode_rgb, EncodeError};
use crate::normalize::NormalizedImage;

/// Output of a ladder search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// Encoded bytes at `quality`.
    pub bytes: Vec<u8>,
    /// The ladder level that produced `bytes`.
    pub quality: u8,
    /// Whether `bytes` is within the ceiling. False only at the floor.
    pub fits: bool,
    /// Number of ladder levels encoded.
    pub attempts: usize,
}

impl Compressed {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Encode `image` with the class's format at the best quality that fits.
///
/// # Errors
///
/// The first encoder error aborts the search. Encoder failures come from the
/// raster or the codec, not the quality setting, so lower levels would fail
/// the same way.
pub fn compress(image: &NormalizedImage, class: &AssetClass) -> Result<Compressed, EncodeError> {
    let format = class.target_format;
    let (width, height) = (image.width(), image.height());

    search_ladder(&class.quality_ladder, class.max_output_bytes, |quality| {
        let bytes = encode_rgb(format, image.pixels(), width, height, quality)?;
        tracing::trace!(quality, byte_size = bytes.len(), "encoded ladder level");
        Ok(bytes)
    })
}

/// Walk `ladder` in order, returning the first output of at most `max_bytes`,
/// or the floor's output when none fits.
pub fn search_ladder<F, E>(
    ladder: &QualityLadder,
    max_bytes: u64,
    mut encode: F,
) -> Result<Compressed, E>
where
    F: FnMut(u8) -> Result<Vec<u8>, E>,
{
    let mut attempts = 0;

    for &quality in ladder.above_floor() {
        attempts += 1;
        let bytes = encode(quality)?;
        if fits(&bytes, max_bytes) {
            return Ok(Compressed {
                bytes,
                quality,
                fits: true,
                attempts,
            });
        }
    }

    // Ladder exhausted: the floor is accepted whatever its size.
    let quality = ladder.floor();
    let bytes = encode(quality)?;
    Ok(Compressed {
        fits: fits(&bytes, max_bytes),
        bytes,
        quality,
        attempts: attempts + 1,
    })
}

#[inline]
fn fits(bytes: &[u8], max_bytes: u64) -> bool {
    bytes.len() as u64 <= max_bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetFormat;
    use crate::decode::{DecodedImage, Orientation, SourceFormat};
    use crate::normalize::normalize;
    use crate::test_support::{gradient_rgb, noise_rgb};
    use image::DynamicImage;

    fn ladder(levels: &[u8]) -> QualityLadder {
        QualityLadder::new(levels.to_vec()).unwrap()
    }

    /// Fake codec whose output is `quality * 10` bytes.
    fn linear_codec(quality: u8) -> Result<Vec<u8>, EncodeError> {
        Ok(vec![0u8; quality as usize * 10])
    }

    fn normalized(img: image::RgbImage, class: &AssetClass) -> NormalizedImage {
        let decoded =
            DecodedImage::new(DynamicImage::ImageRgb8(img), SourceFormat::Png, Orientation::Normal)
                .unwrap();
        normalize(decoded, class)
    }

    #[test]
    fn test_first_level_that_fits_wins() {
        let result = search_ladder(&ladder(&[85, 75, 65, 55, 50]), 600, linear_codec).unwrap();

        assert_eq!(result.quality, 55);
        assert_eq!(result.byte_size(), 550);
        assert!(result.fits);
        assert_eq!(result.attempts, 4);
    }

    #[test]
    fn test_top_level_fits_immediately() {
        let result = search_ladder(&ladder(&[85, 75]), 10_000, linear_codec).unwrap();
        assert_eq!(result.quality, 85);
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn test_exact_ceiling_fits() {
        let result = search_ladder(&ladder(&[85, 75]), 750, linear_codec).unwrap();
        assert_eq!(result.quality, 75);
        assert!(result.fits);
    }

    #[test]
    fn test_exhausted_ladder_accepts_floor() {
        let result = search_ladder(&ladder(&[85, 75, 65, 55, 50]), 100, linear_codec).unwrap();

        assert_eq!(result.quality, 50);
        assert_eq!(result.byte_size(), 500);
        assert!(!result.fits);
        assert_eq!(result.attempts, 5);
    }

    #[test]
    fn test_single_level_ladder() {
        let result = search_ladder(&ladder(&[40]), 1, linear_codec).unwrap();
        assert_eq!(result.quality, 40);
        assert!(!result.fits);
    }

    #[test]
    fn test_encoder_error_aborts_without_retry() {
        let mut calls = 0;
        let result: Result<Compressed, &str> =
            search_ladder(&ladder(&[85, 75, 65]), 0, |_| {
                calls += 1;
                Err("codec failure")
            });

        assert_eq!(result, Err("codec failure"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_encoder_error_mid_ladder_aborts() {
        let mut tried = Vec::new();
        let result = search_ladder(&ladder(&[85, 75, 65]), 0, |q| {
            tried.push(q);
            if q == 75 {
                Err("codec failure")
            } else {
                Ok(vec![0u8; 10])
            }
        });

        assert!(result.is_err());
        assert_eq!(tried, vec![85, 75]);
    }

    #[test]
    fn test_compress_simple_image_at_top_quality() {
        let class = AssetClass::category();
        let image = normalized(gradient_rgb(600, 400), &class);
        let result = compress(&image, &class).unwrap();

        assert_eq!(result.quality, 85);
        assert!(result.fits);
        assert_eq!(&result.bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_compress_noise_under_tight_ceiling_steps_down() {
        let mut class = AssetClass::product();
        class.canonical_width = 256;
        class.canonical_height = 256;
        let image = normalized(noise_rgb(256, 256, 3), &class);

        // Ceiling between the q50 and q85 sizes forces at least one step down.
        let top = encode_rgb(TargetFormat::Webp, image.pixels(), 256, 256, 85).unwrap();
        let floor = encode_rgb(TargetFormat::Webp, image.pixels(), 256, 256, 50).unwrap();
        assert!(floor.len() < top.len());
        class.max_output_bytes = floor.len() as u64;

        let result = compress(&image, &class).unwrap();
        assert!(result.quality < 85);
        assert!(result.byte_size() <= class.max_output_bytes);
    }

    #[test]
    fn test_compress_jpeg_target() {
        let mut class = AssetClass::category();
        class.target_format = TargetFormat::Jpeg;
        let image = normalized(gradient_rgb(600, 400), &class);
        let result = compress(&image, &class).unwrap();

        assert_eq!(&result.bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(result.quality, 85);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
