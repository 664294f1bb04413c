//! Assetpipe Core - Image ingestion pipeline
//!
//! This crate turns arbitrary user-uploaded images into canonical stored
//! assets for a catalog: decode, flatten and resize to the asset class's
//! dimensions, compress under a size target, and atomically replace the file
//! on disk.
//!
//! The catalog layer owns everything else (entities, auth, routing). It hands
//! the pipeline bytes plus an [`AssetClass`] and gets back a [`StoredAsset`].
//!
//! ```ignore
//! use assetpipe_core::{AssetClass, AssetStore, Pipeline};
//!
//! let pipeline = Pipeline::new(AssetStore::new("/srv/uploads"));
//! let bytes = std::fs::read("latte.jpg")?;
//! let asset = pipeline.process_upload(&bytes, "jpg", &AssetClass::product(), "latte")?;
//! println!("{} ({} bytes, q{})", asset.path.display(), asset.byte_size, asset.quality_used);
//! ```

pub mod compress;
pub mod config;
pub mod decode;
pub mod encode;
pub mod normalize;
pub mod pipeline;
pub mod store;

#[cfg(test)]
mod test_support;

pub use compress::{compress, search_ladder, Compressed};
pub use config::{
    AssetClass, Background, ConfigError, FilterType, PipelineConfig, QualityLadder, TargetFormat,
};
pub use decode::{decode_upload, DecodeError, DecodedImage, SourceFormat};
pub use encode::EncodeError;
pub use normalize::{normalize, NormalizedImage};
pub use pipeline::{ErrorKind, Pipeline, PipelineError, RawUpload, Stage, StoredAsset};
pub use store::{AssetStore, StoreError};
