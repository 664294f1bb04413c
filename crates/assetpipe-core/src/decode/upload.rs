//! Decoding of raw upload bytes.

use std::io::Cursor;

use image::error::ImageError;
use image::{ImageReader, Limits};

use super::{DecodeError, DecodedImage, Orientation, SourceFormat};

/// Decode uploaded bytes into an upright raster.
///
/// The declared extension is checked against the whitelist before the bytes
/// are touched. The byte signature then decides which decoder runs: a PNG
/// uploaded as `photo.jpg` decodes fine, while a GIF uploaded as `photo.png`
/// is rejected. Bytes with no recognizable signature are handed to the
/// declared format's decoder, which reports them as corrupt.
///
/// # Arguments
///
/// * `bytes` - Raw upload bytes
/// * `declared_extension` - Extension supplied with the upload (e.g. "jpg")
/// * `max_dimension` - Longest accepted width or height in pixels
///
/// # Errors
///
/// * `DecodeError::UnsupportedExtension` if the extension is not whitelisted
/// * `DecodeError::UnsupportedFormat` if the signature names another format
/// * `DecodeError::LimitsExceeded` if the image is larger than `max_dimension`
/// * `DecodeError::CorruptedFile` for truncated or malformed payloads
/// * `DecodeError::EmptyImage` if the raster has no pixels
pub fn decode_upload(
    bytes: &[u8],
    declared_extension: &str,
    max_dimension: u32,
) -> Result<DecodedImage, DecodeError> {
    let declared = SourceFormat::from_extension(declared_extension)?;
    let format = sniff_format(bytes, declared)?;

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format.to_image_format());
    reader.limits(decode_limits(max_dimension));

    let img = reader.decode().map_err(map_image_error)?;

    let orientation = Orientation::from_exif(bytes);
    DecodedImage::new(orientation.apply(img), format, orientation)
}

/// Pick the decoder from the byte signature, falling back to the declared format.
fn sniff_format(bytes: &[u8], declared: SourceFormat) -> Result<SourceFormat, DecodeError> {
    match image::guess_format(bytes) {
        Ok(sniffed) => SourceFormat::from_image_format(sniffed)
            .ok_or_else(|| DecodeError::UnsupportedFormat(format!("{sniffed:?}"))),
        Err(_) => Ok(declared),
    }
}

fn decode_limits(max_dimension: u32) -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    limits
}

fn map_image_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Limits(e) => DecodeError::LimitsExceeded(e.to_string()),
        ImageError::Unsupported(e) => DecodeError::UnsupportedFormat(e.to_string()),
        other => DecodeError::CorruptedFile(other.to_string()),
    }
}
