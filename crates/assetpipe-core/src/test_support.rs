//! Fixture generators shared by unit tests.
//!
//! Fixtures are produced in-process with the image crate and libwebp so no
//! binary files are checked in.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

/// Deterministic RGB noise; compresses badly, which is the point.
pub(crate) fn noise_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        image::Rgb([next(), next(), next()])
    })
}

/// Smooth two-axis gradient, a stand-in for a typical photo.
pub(crate) fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
        ])
    })
}

/// Gradient with low-amplitude grain: large as a high-quality JPEG, yet
/// compressible once downscaled, like a camera photo.
pub(crate) fn photo_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
    let grain = noise_rgb(width, height, seed);
    let mut img = gradient_rgb(width, height);
    for (pixel, noise) in img.pixels_mut().zip(grain.pixels()) {
        for (channel, n) in pixel.0.iter_mut().zip(noise.0) {
            // n / 16 - 8 spans -8..=7
            let offset = i16::from(n / 16) - 8;
            *channel = (i16::from(*channel) + offset).clamp(0, 255) as u8;
        }
    }
    img
}

pub(crate) fn jpeg_bytes(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(img)
        .unwrap();
    buffer
}

/// A solid-color RGBA PNG.
pub(crate) fn png_rgba_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    png_bytes(DynamicImage::ImageRgba8(img))
}

pub(crate) fn png_bytes(img: DynamicImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub(crate) fn webp_bytes(img: &RgbImage, quality: f32) -> Vec<u8> {
    webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height())
        .encode(quality)
        .to_vec()
}

/// Insert an APP1 EXIF segment carrying only an orientation tag right after
/// the JPEG SOI marker.
pub(crate) fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let [lo, hi] = orientation.to_le_bytes();
    #[rustfmt::skip]
    let tiff: [u8; 26] = [
        // Little-endian TIFF header, IFD0 at offset 8
        0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00,
        // One entry
        0x01, 0x00,
        // Tag 0x0112 (Orientation), SHORT, count 1, value
        0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, lo, hi, 0x00, 0x00,
        // No next IFD
        0x00, 0x00, 0x00, 0x00,
    ];
    let payload_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload_len as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&payload_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}
