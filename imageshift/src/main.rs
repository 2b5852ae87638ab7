use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Rewrite the container images of annotated workloads in a manifest
    /// stream, the way the restore hook would during an actual restore.
    Restore {
        /// Manifest file to read, `-` or omitted for stdin.
        file: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Restore { file } => {
            let input = match &file {
                Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
                    .with_context(|| format!("reading manifests from {}", path.display()))?,
                _ => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading manifests from stdin")?;
                    buf
                }
            };

            imageshift::restore_manifests(&input, &mut std::io::stdout().lock())
        }
    }
}
