use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use migspat::cli::{Cli, Commands};
use migspat::commands::{flows, moran, neighbors};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Neighbors(args) => neighbors::run(&cli, args),
        Commands::Moran(args) => moran::run(&cli, args),
        Commands::Flows(args) => flows::run(&cli, args),
    }
}
