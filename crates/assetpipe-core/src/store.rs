//! Filesystem storage for encoded assets.
//!
//! Layout is one file per asset, grouped by class folder:
//!
//! ```text
//! <root>/products/espresso-cup.webp
//! <root>/categories/hot-drinks.webp
//! ```
//!
//! There is no index; existence and size come from the filesystem.
//!
//! Writes go to a temporary file in the destination folder and are renamed
//! into place. Rename within one directory is atomic, so a concurrent reader
//! sees either the previous complete file or the new complete file. Two
//! concurrent writes to the same path both succeed and the later rename wins.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{is_safe_segment, TargetFormat};

/// Prefix of in-flight temporary files. Leading dot keeps them out of
/// directory listings served to clients.
const TEMP_PREFIX: &str = ".upload-";
const TEMP_SUFFIX: &str = ".tmp";

/// Errors raised by the asset store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A logical name or folder would escape its directory or is empty.
    #[error("invalid asset name {0:?}")]
    InvalidName(String),

    /// A filesystem operation failed.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes reached the disk than were handed to the store.
    #[error("short write: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },
}

impl StoreError {
    fn io<'a>(op: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> StoreError + 'a {
        move |source| StoreError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Asset files rooted at one directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative path of the asset for `logical_name` in `folder`.
    ///
    /// Both components must be plain file names: ASCII alphanumerics, `-`,
    /// `_`, `.`, not starting with a dot.
    pub fn asset_path(
        folder: &str,
        logical_name: &str,
        format: TargetFormat,
    ) -> Result<PathBuf, StoreError> {
        if !is_safe_segment(folder) {
            return Err(StoreError::InvalidName(folder.to_string()));
        }
        if !is_safe_segment(logical_name) {
            return Err(StoreError::InvalidName(logical_name.to_string()));
        }
        Ok(Path::new(folder).join(format!("{logical_name}.{}", format.extension())))
    }

    /// Absolute location of a relative asset path.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `bytes` to `relative`, atomically replacing any existing asset.
    ///
    /// Returns the persisted size, measured from the filesystem. On failure the
    /// temporary file is removed and any previous asset is left as it was.
    pub fn write(&self, relative: &Path, bytes: &[u8]) -> Result<u64, StoreError> {
        let final_path = self.resolve(relative);
        let folder = final_path
            .parent()
            .ok_or_else(|| StoreError::InvalidName(relative.display().to_string()))?;

        fs::create_dir_all(folder).map_err(StoreError::io("create folder", folder))?;

        // Dropping `temp` deletes the file, which covers every early return.
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(folder)
            .map_err(StoreError::io("create temp file in", folder))?;

        temp.write_all(bytes)
            .map_err(StoreError::io("write", temp.path()))?;
        temp.as_file()
            .sync_all()
            .map_err(StoreError::io("sync", temp.path()))?;

        let persisted = temp
            .as_file()
            .metadata()
            .map_err(StoreError::io("stat", temp.path()))?
            .len();
        let expected = bytes.len() as u64;
        if persisted != expected {
            return Err(StoreError::Truncated {
                expected,
                actual: persisted,
            });
        }

        set_shared_access(temp.path())?;

        temp.persist(&final_path)
            .map_err(|e| StoreError::Io {
                op: "rename onto",
                path: final_path.clone(),
                source: e.error,
            })?;

        tracing::debug!(path = %final_path.display(), bytes = persisted, "asset persisted");
        Ok(persisted)
    }

    /// Remove the asset at `relative`. Returns false if it did not exist.
    pub fn delete(&self, relative: &Path) -> Result<bool, StoreError> {
        let path = self.resolve(relative);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("remove", &path)(e)),
        }
    }

    /// Size in bytes of the asset at `relative`, if there is one.
    pub fn stat(&self, relative: &Path) -> Result<Option<u64>, StoreError> {
        let path = self.resolve(relative);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("stat", &path)(e)),
        }
    }
}

/// Grant read, write and execute to owner, group and others.
///
/// The static file server, the upload workers and ops tooling run as
/// different users and all need direct access.
#[cfg(unix)]
fn set_shared_access(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o777))
        .map_err(StoreError::io("set permissions on", path))
}

#[cfg(not(unix))]
fn set_shared_access(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
