//! Upload orchestration.
//!
//! One call to [`Pipeline::process_upload`] is one linear run:
//!
//! ```text
//! received -> decoded -> normalized -> compressed -> stored
//!     \__________\____________\____________\_________-> failed(kind)
//! ```
//!
//! Each step runs at most once and nothing is retried; a caller that wants to
//! retry submits the upload again. Runs share no in-process state, so any
//! number may execute concurrently. Runs targeting the same logical name race
//! on the final rename and the last one wins.

use std::error::Error as _;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

use crate::compress::compress;
use crate::config::{AssetClass, ConfigError, PipelineConfig};
use crate::decode::{decode_upload, DecodeError};
use crate::encode::EncodeError;
use crate::normalize::normalize;
use crate::store::{AssetStore, StoreError};

/// Steps of a pipeline run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Received,
    Decoded,
    Normalized,
    Compressed,
    Stored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::Normalized => "normalized",
            Stage::Compressed => "compressed",
            Stage::Stored => "stored",
        })
    }
}

/// Flat classification of pipeline failures for callers mapping to API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InputTooLarge,
    UnsupportedExtension,
    InvalidAssetClass,
    DecodeFailed,
    EncodeFailed,
    StorageFailed,
}

/// Why a pipeline run failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload exceeds the class's input ceiling; nothing was decoded.
    #[error("upload is {size} bytes, limit is {limit}")]
    InputTooLarge { size: u64, limit: u64 },

    /// Declared extension is not one of jpg, jpeg, png, webp.
    #[error("unsupported file extension {0:?}")]
    UnsupportedExtension(String),

    /// The asset class itself is misconfigured.
    #[error("invalid asset class")]
    InvalidAssetClass(#[source] ConfigError),

    /// The bytes are not a valid image.
    #[error("could not decode upload")]
    DecodeFailed(#[source] DecodeError),

    /// The normalized raster could not be encoded at any quality.
    #[error("could not encode asset")]
    EncodeFailed(#[from] EncodeError),

    /// The encoded asset could not be persisted.
    #[error("could not store asset")]
    StorageFailed(#[from] StoreError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InputTooLarge { .. } => ErrorKind::InputTooLarge,
            PipelineError::UnsupportedExtension(_) => ErrorKind::UnsupportedExtension,
            PipelineError::InvalidAssetClass(_) => ErrorKind::InvalidAssetClass,
            PipelineError::DecodeFailed(_) => ErrorKind::DecodeFailed,
            PipelineError::EncodeFailed(_) => ErrorKind::EncodeFailed,
            PipelineError::StorageFailed(_) => ErrorKind::StorageFailed,
        }
    }

    /// The last stage the run reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InputTooLarge { .. }
            | PipelineError::UnsupportedExtension(_)
            | PipelineError::InvalidAssetClass(_)
            | PipelineError::DecodeFailed(_)
            | PipelineError::StorageFailed(StoreError::InvalidName(_)) => Stage::Received,
            PipelineError::EncodeFailed(_) => Stage::Normalized,
            PipelineError::StorageFailed(_) => Stage::Compressed,
        }
    }
}

impl From<DecodeError> for PipelineError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedExtension(ext) => PipelineError::UnsupportedExtension(ext),
            other => PipelineError::DecodeFailed(other),
        }
    }
}

/// An upload as received from the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    pub bytes: Vec<u8>,
    /// Declared extension, without the dot.
    pub extension: String,
}

impl RawUpload {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }

    /// Take the declared extension from an uploaded file name.
    ///
    /// A name without an extension yields an empty one, which the decoder
    /// rejects.
    pub fn from_filename(bytes: Vec<u8>, filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { bytes, extension }
    }
}

/// Descriptor of a persisted asset, returned to the catalog layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Path relative to the storage root, e.g. `products/latte.webp`.
    pub path: PathBuf,
    /// Size of the file on disk.
    pub byte_size: u64,
    /// Quality level that produced the stored bytes.
    pub quality_used: u8,
}

/// Runs uploads against one asset store.
#[derive(Debug, Clone)]
pub struct Pipeline {
    store: AssetStore,
}

impl Pipeline {
    pub fn new(store: AssetStore) -> Self {
        Self { store }
    }

    /// Build a pipeline over the configured storage root.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(AssetStore::new(&config.storage_root))
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Run a [`RawUpload`] through the pipeline.
    pub fn process(
        &self,
        upload: &RawUpload,
        class: &AssetClass,
        logical_name: &str,
    ) -> Result<StoredAsset, PipelineError> {
        self.process_upload(&upload.bytes, &upload.extension, class, logical_name)
    }

    /// Decode, normalize, compress and store one upload.
    ///
    /// On success the asset at the class folder's `logical_name` path has been
    /// atomically replaced. On failure nothing was published.
    pub fn process_upload(
        &self,
        bytes: &[u8],
        declared_extension: &str,
        class: &AssetClass,
        logical_name: &str,
    ) -> Result<StoredAsset, PipelineError> {
        let span = info_span!("process_upload", class = %class.name, logical_name);
        let _guard = span.enter();

        let result = self.run(bytes, declared_extension, class, logical_name);
        match &result {
            Ok(asset) => info!(
                logical_name,
                byte_size = asset.byte_size,
                quality_used = asset.quality_used,
                mime_type = class.target_format.mime_type(),
                path = %asset.path.display(),
                "stored asset"
            ),
            // Encoding a valid raster should never fail.
            Err(err @ PipelineError::EncodeFailed(_)) => {
                error!(error = %err, cause = ?err.source(), "encoder anomaly")
            }
            Err(err) => warn!(
                error = %err,
                cause = ?err.source(),
                kind = ?err.kind(),
                stage = %err.stage(),
                "upload rejected"
            ),
        }
        result
    }

    fn run(
        &self,
        bytes: &[u8],
        declared_extension: &str,
        class: &AssetClass,
        logical_name: &str,
    ) -> Result<StoredAsset, PipelineError> {
        class.validate().map_err(PipelineError::InvalidAssetClass)?;

        let size = bytes.len() as u64;
        if size > class.max_input_bytes {
            return Err(PipelineError::InputTooLarge {
                size,
                limit: class.max_input_bytes,
            });
        }
        // Resolve the destination up front so a bad name costs no CPU.
        let path = AssetStore::asset_path(&class.folder, logical_name, class.target_format)?;
        debug!(stage = %Stage::Received, size);

        let decoded = decode_upload(bytes, declared_extension, class.max_input_dimension)?;
        debug!(
            stage = %Stage::Decoded,
            width = decoded.width(),
            height = decoded.height(),
            alpha = decoded.has_alpha(),
            format = %decoded.format()
        );

        let normalized = normalize(decoded, class);
        debug!(stage = %Stage::Normalized, width = normalized.width(), height = normalized.height());

        let compressed = compress(&normalized, class)?;
        if !compressed.fits {
            warn!(
                byte_size = compressed.byte_size(),
                max_output_bytes = class.max_output_bytes,
                quality = compressed.quality,
                "quality floor reached above size target"
            );
        }
        debug!(
            stage = %Stage::Compressed,
            quality = compressed.quality,
            attempts = compressed.attempts,
            byte_size = compressed.byte_size()
        );

        let byte_size = self.store.write(&path, &compressed.bytes)?;
        debug!(stage = %Stage::Stored, byte_size);

        Ok(StoredAsset {
            path,
            byte_size,
            quality_used: compressed.quality,
        })
    }

    /// Delete the asset stored for `logical_name`. Returns false if absent.
    ///
    /// The catalog layer calls this when an entity's image moves to a
    /// different logical name.
    pub fn remove(&self, class: &AssetClass, logical_name: &str) -> Result<bool, PipelineError> {
        let path = AssetStore::asset_path(&class.folder, logical_name, class.target_format)?;
        let removed = self.store.delete(&path)?;
        info!(class = %class.name, logical_name, removed, path = %path.display(), "asset removed");
        Ok(removed)
    }

    /// Relative path and size of the asset stored for `logical_name`, if any.
    pub fn lookup(
        &self,
        class: &AssetClass,
        logical_name: &str,
    ) -> Result<Option<(PathBuf, u64)>, PipelineError> {
        let path = AssetStore::asset_path(&class.folder, logical_name, class.target_format)?;
        Ok(self.store.stat(&path)?.map(|size| (path, size)))
    }
}
