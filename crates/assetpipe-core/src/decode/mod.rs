//! Upload decoding.
//!
//! This module turns raw upload bytes into an in-memory raster:
//! - Whitelisting the declared extension (jpeg, png, webp)
//! - Sniffing the byte signature to pick the decoder
//! - Enforcing dimension limits against decompression bombs
//! - Applying EXIF orientation so rasters are upright
//!
//! Decoding has no side effects and returns no partial result on failure.
//!
//! # Examples
//!
//! ```ignore
//! use assetpipe_core::decode::decode_upload;
//!
//! let bytes = std::fs::read("latte.jpg").unwrap();
//! let image = decode_upload(&bytes, "jpg", 16_384).unwrap();
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod orientation;
mod types;
mod upload;

pub use orientation::Orientation;
pub use types::{DecodeError, DecodedImage, SourceFormat};
pub use upload::decode_upload;
