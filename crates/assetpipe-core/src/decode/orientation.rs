//! EXIF orientation handling.
//!
//! Phone cameras store pixels in sensor order and record the display rotation
//! in the EXIF orientation tag. Applying it before normalization keeps stored
//! assets upright no matter how the device was held.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl Orientation {
    /// Read the orientation tag from an image container.
    ///
    /// Missing or unreadable EXIF data means `Normal`; orientation is a
    /// best-effort correction and never fails an upload.
    pub fn from_exif(bytes: &[u8]) -> Orientation {
        let mut cursor = Cursor::new(bytes);
        let Ok(exif) = Reader::new().read_from_container(&mut cursor) else {
            return Orientation::Normal;
        };
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default()
    }

    /// Rotate/flip a raster so it displays upright.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate90CW => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate270CW => img.rotate270(),
        }
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two pixels side by side: red on the left, green on the right.
    fn red_green_strip() -> DynamicImage {
        let pixels = vec![255, 0, 0, 0, 255, 0];
        DynamicImage::ImageRgb8(image::RgbImage::from_raw(2, 1, pixels).unwrap())
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(8), Orientation::Rotate270CW);
        assert_eq!(Orientation::from(0), Orientation::Normal);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_from_exif_without_metadata() {
        assert_eq!(Orientation::from_exif(b"not an image"), Orientation::Normal);
        assert_eq!(Orientation::from_exif(&[]), Orientation::Normal);
    }

    #[test]
    fn test_apply_normal_is_identity() {
        let result = Orientation::Normal.apply(red_green_strip()).into_rgb8();
        assert_eq!(result.dimensions(), (2, 1));
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_rotate90_swaps_dimensions() {
        let result = Orientation::Rotate90CW.apply(red_green_strip()).into_rgb8();
        assert_eq!(result.dimensions(), (1, 2));
        // Clockwise: the left pixel ends up on top.
        assert_eq!(result.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_rotate180() {
        let result = Orientation::Rotate180.apply(red_green_strip()).into_rgb8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(result.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_apply_flip_horizontal() {
        let result = Orientation::FlipHorizontal.apply(red_green_strip()).into_rgb8();
        assert_eq!(result.get_pixel(0, 0).0, [0, 255, 0]);
    }

    #[test]
    fn test_only_quarter_turns_swap_dimensions() {
        for value in 1..=8u32 {
            let orientation = Orientation::from(value);
            let dims = orientation.apply(red_green_strip()).into_rgb8().dimensions();
            let expected = if value >= 5 { (1, 2) } else { (2, 1) };
            assert_eq!(dims, expected, "{orientation:?}");
        }
    }
}
