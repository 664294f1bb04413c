//! # Remove Subcommand
//!
//! Deletes the stored asset for a logical name.

use assetpipe_core::Pipeline;
use clap::Args;

use crate::ConfigArgs;

/// Arguments for the remove subcommand.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Asset class the asset belongs to.
    #[arg(long)]
    pub class: String,

    /// Logical name of the asset.
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Returns whether an asset was removed.
pub fn run(args: &RemoveArgs) -> anyhow::Result<bool> {
    let config = args.config.load()?;
    let class = config.class(&args.class)?;
    Ok(Pipeline::from_config(&config).remove(class, &args.name)?)
}
