//! # assetpipe CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Image ingestion pipeline for catalog assets.
///
/// Decodes uploads, normalizes them to an asset class's canonical size,
/// compresses under the class's size target and stores them atomically.
#[derive(Parser, Debug)]
#[command(name = "assetpipe", version, about)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ingest an image file as an asset.
    Ingest(assetpipe_cli::ingest::IngestArgs),
    /// Delete a stored asset.
    Remove(assetpipe_cli::remove::RemoveArgs),
    /// List configured asset classes.
    Classes(assetpipe_cli::classes::ClassesArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Ingest(args) => {
            let asset = assetpipe_cli::ingest::run(&args)?;
            println!(
                "{} ({} bytes, quality {})",
                asset.path.display(),
                asset.byte_size,
                asset.quality_used
            );
        }
        Commands::Remove(args) => {
            if assetpipe_cli::remove::run(&args)? {
                println!("removed {}", args.name);
            } else {
                println!("no asset named {}", args.name);
            }
        }
        Commands::Classes(args) => {
            for line in assetpipe_cli::classes::run(&args)? {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from([
            "assetpipe",
            "ingest",
            "--class",
            "product",
            "--name",
            "latte",
            "latte.jpg",
            "--config",
            "assetpipe.toml",
        ])
        .unwrap();

        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.class, "product");
                assert_eq!(args.name.as_deref(), Some("latte"));
                assert_eq!(args.file, std::path::PathBuf::from("latte.jpg"));
                assert_eq!(
                    args.config.config,
                    Some(std::path::PathBuf::from("assetpipe.toml"))
                );
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_logs_after_subcommand() {
        let cli = Cli::try_parse_from(["assetpipe", "classes", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
    }

    #[test]
    fn test_remove_requires_name() {
        assert!(Cli::try_parse_from(["assetpipe", "remove", "--class", "product"]).is_err());
    }
}
