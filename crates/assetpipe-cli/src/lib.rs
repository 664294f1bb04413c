//! # assetpipe CLI
//!
//! Operator front end for the ingestion pipeline. Each subcommand lives in its
//! own module with an `Args` struct and a `run` function.

pub mod classes;
pub mod ingest;
pub mod remove;

use std::path::{Path, PathBuf};

use anyhow::Context;
use assetpipe_core::PipelineConfig;
use clap::Args;

/// Configuration source shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// TOML file with `storage_root` and `[classes.*]` tables. Built-in
    /// product/category classes are used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured storage root.
    #[arg(long)]
    pub storage_root: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(root) = &self.storage_root {
            config.storage_root = root.clone();
        }
        Ok(config)
    }
}

fn load_config(path: &Path) -> anyhow::Result<PipelineConfig> {
    PipelineConfig::load(path).with_context(|| format!("loading {}", path.display()))
}
