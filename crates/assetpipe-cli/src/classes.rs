//! # Classes Subcommand
//!
//! Lists configured asset classes.

use assetpipe_core::AssetClass;
use clap::Args;

use crate::ConfigArgs;

/// Arguments for the classes subcommand.
#[derive(Args, Debug)]
pub struct ClassesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run(args: &ClassesArgs) -> anyhow::Result<Vec<String>> {
    let config = args.config.load()?;
    Ok(config.classes.values().map(describe).collect())
}

/// One-line summary of a class.
pub fn describe(class: &AssetClass) -> String {
    let ladder: Vec<String> = class
        .quality_ladder
        .levels()
        .iter()
        .map(u8::to_string)
        .collect();
    format!(
        "{name}: {w}x{h} {format} -> {folder}/ (target {max} bytes, ladder [{ladder}])",
        name = class.name,
        w = class.canonical_width,
        h = class.canonical_height,
        format = class.target_format,
        folder = class.folder,
        max = class.max_output_bytes,
        ladder = ladder.join(", "),
    )
}
