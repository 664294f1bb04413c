//! Normalization to an asset class's canonical raster.
//!
//! Every stored asset of a class has the same pixel dimensions and no
//! transparency. Aspect ratio is deliberately not preserved: square vs.
//! landscape intent is chosen by picking the asset class, not by cropping.
//!
//! Transparency is flattened *before* resizing so the color channels of fully
//! transparent pixels (often garbage or black) never bleed into visible edges
//! through the resampling kernel.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::config::{AssetClass, Background, FilterType};
use crate::decode::DecodedImage;

/// An opaque RGB raster at canonical dimensions.
///
/// Owned by the single pipeline run that produced it.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    raster: RgbImage,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub fn pixels(&self) -> &[u8] {
        self.raster.as_raw()
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }
}

/// Flatten and resize a decoded upload to the class's canonical raster.
pub fn normalize(decoded: DecodedImage, class: &AssetClass) -> NormalizedImage {
    let opaque = flatten(decoded.into_image(), class.background);
    let raster = resize_exact(
        opaque,
        class.canonical_width,
        class.canonical_height,
        class.filter,
    );
    NormalizedImage { raster }
}

/// Drop the alpha channel, compositing onto `background` when there is one.
pub fn flatten(img: DynamicImage, background: Background) -> RgbImage {
    if img.color().has_alpha() {
        composite_over(&img.into_rgba8(), background)
    } else {
        img.into_rgb8()
    }
}

/// Composite straight-alpha RGBA over an opaque background.
pub fn composite_over(rgba: &RgbaImage, background: Background) -> RgbImage {
    let bg = background.to_array();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        image::Rgb([blend(r, bg[0], a), blend(g, bg[1], a), blend(b, bg[2], a)])
    })
}

/// `(src·a + bg·(255−a)) / 255`, rounded.
#[inline]
fn blend(src: u8, bg: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    let value = u32::from(src) * a + u32::from(bg) * (255 - a);
    ((value + 127) / 255) as u8
}

/// Resize to exact dimensions, ignoring aspect ratio.
///
/// Returns the input untouched when it already has the target size.
pub fn resize_exact(img: RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img;
    }
    image::imageops::resize(&img, width, height, filter.to_image_filter())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
