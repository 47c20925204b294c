use anyhow::Result;
use clap::Parser;

use medsum::cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command)
}

fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Summarize {
            path,
            length,
            include,
            format,
            common,
        } => medsum::cli::summarize::run(path.as_deref(), length, include, format, &common),
        Commands::Normalize {
            path,
            annotate,
            common,
        } => medsum::cli::normalize::run(path.as_deref(), annotate, &common),
        Commands::Dictionary {
            file,
            abbreviations,
            patterns,
        } => medsum::cli::dictionary::run(file.as_deref(), abbreviations, patterns),
    }
}
