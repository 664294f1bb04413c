//! # Ingest Subcommand
//!
//! Runs one file through the pipeline and reports the stored asset.

use std::path::PathBuf;

use anyhow::Context;
use assetpipe_core::{Pipeline, RawUpload, StoredAsset};
use clap::Args;

use crate::ConfigArgs;

/// Arguments for the ingest subcommand.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Asset class to normalize to (e.g. "product").
    #[arg(long)]
    pub class: String,

    /// Logical name; the asset is stored as `<folder>/<name>.<ext>`.
    /// Defaults to the input file's stem.
    #[arg(long)]
    pub name: Option<String>,

    /// Image file to ingest.
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &IngestArgs) -> anyhow::Result<StoredAsset> {
    let config = args.config.load()?;
    let class = config.class(&args.class)?;

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    tracing::debug!(file = %args.file.display(), bytes = bytes.len(), "read input file");
    let filename = args.file.to_string_lossy();
    let upload = RawUpload::from_filename(bytes, &filename);

    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("input file has no name to derive a logical name from")?,
    };

    let asset = Pipeline::from_config(&config)
        .process(&upload, class, &name)
        .with_context(|| format!("ingesting {}", args.file.display()))?;
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write_png(dir: &std::path::Path, name: &str) -> PathBuf {
        let img = image::RgbImage::from_pixel(40, 30, image::Rgb([120, 60, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_ingest_derives_name_from_file() {
        let input = tempfile::TempDir::new().unwrap();
        let storage = tempfile::TempDir::new().unwrap();
        let file = write_png(input.path(), "cold-brew.png");

        let asset = run(&IngestArgs {
            class: "category".to_string(),
            name: None,
            file,
            config: ConfigArgs {
                config: None,
                storage_root: Some(storage.path().to_path_buf()),
            },
        })
        .unwrap();

        assert_eq!(asset.path, PathBuf::from("categories/cold-brew.webp"));
        assert!(storage.path().join(&asset.path).is_file());
    }

    #[test]
    fn test_ingest_unknown_class() {
        let input = tempfile::TempDir::new().unwrap();
        let file = write_png(input.path(), "x.png");

        let err = run(&IngestArgs {
            class: "banner".to_string(),
            name: Some("x".to_string()),
            file,
            config: ConfigArgs::default(),
        })
        .unwrap_err();

        assert!(err.to_string().contains("unknown asset class"));
    }
}
