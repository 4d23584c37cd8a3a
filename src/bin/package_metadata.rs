//! Regenerate `package_metadata.json` from git and print it.
//!
//! Run from a checkout before packaging:
//!
//! ```bash
//! cargo run --features cli --bin package-metadata -- --root . --verbose
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use explorer_hat::metadata::{self, GitCli, DEFAULT_BASE_VERSION, DEFAULT_METADATA_FILE};

#[derive(Parser, Debug)]
#[command(name = "package-metadata")]
#[command(about = "Derive the package version from git and write the metadata file")]
struct Args {
    /// Package root (the directory holding `.git` and the readme)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Metadata file, relative to the root
    #[arg(short, long, default_value = DEFAULT_METADATA_FILE)]
    output: PathBuf,

    /// Version whose last component is replaced by the commit count
    /// (defaults to this crate's version)
    #[arg(short, long, default_value = DEFAULT_BASE_VERSION)]
    base_version: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "explorer_hat=debug,info"
    } else {
        "explorer_hat=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let git = GitCli::new(&args.root);
    let metadata = metadata::load_or_update(&args.root, &args.output, &args.base_version, &git)?;

    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["package-metadata"]);
        assert_eq!(args.base_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(args.output, PathBuf::from("package_metadata.json"));
        assert_eq!(args.root, PathBuf::from("."));
        assert!(!args.verbose);
    }

    #[test]
    fn base_version_override() {
        let args = Args::parse_from(["package-metadata", "--base-version", "0.1.1", "-v"]);
        assert_eq!(args.base_version, "0.1.1");
        assert!(args.verbose);
    }
}
