pub mod dictionary;
pub mod input;
pub mod normalize;
pub mod summarize;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use medsum_core::{Category, SummaryLength};

#[derive(Parser)]
#[command(
    name = "medsum",
    about = "Rule-based medical report summarizer",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a report into clinical and patient-friendly variants
    Summarize {
        /// Report file (.txt or .md); reads stdin when omitted or '-'
        path: Option<PathBuf>,
        /// Summary length
        #[arg(short, long)]
        length: Option<SummaryLength>,
        /// Only score these categories (comma separated or repeated)
        #[arg(short, long = "include", value_delimiter = ',')]
        include: Vec<Category>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print the normalized report, one sentence per line
    Normalize {
        /// Report file (.txt or .md); reads stdin when omitted or '-'
        path: Option<PathBuf>,
        /// Follow each expansion with its original abbreviation
        #[arg(short, long)]
        annotate: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Validate a dictionary and show what it contains
    Dictionary {
        /// Dictionary JSON file (built-in dictionary if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
        /// List every abbreviation and its expansions
        #[arg(long)]
        abbreviations: bool,
        /// List every sentence pattern with its weight and keywords
        #[arg(long)]
        patterns: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Custom dictionary JSON file
    #[arg(long)]
    pub dictionary: Option<PathBuf>,
    /// Keep identifiers (SSN, phone, dates, MRN) instead of redacting them
    #[arg(long)]
    pub no_redact: bool,
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
