use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use medsum_core::loader::{self, DocumentFormat, LoadedDocument};
use medsum_core::SummaryPipeline;

use super::CommonArgs;
use crate::config::{AppConfig, Overrides, Settings};

/// Reads the report from `path`, or from stdin when no path (or `-`) is given.
pub fn read_report(path: Option<&Path>) -> Result<LoadedDocument> {
    match path {
        Some(path) if path != Path::new("-") => loader::load_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        _ => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("failed to read stdin")?;
            Ok(loader::load_bytes(&data, DocumentFormat::PlainText)?)
        }
    }
}

/// Merges the config file, environment and flags into run settings.
pub fn resolve_settings(common: &CommonArgs, mut overrides: Overrides) -> Result<Settings> {
    let config = AppConfig::load(common.config.as_deref())?.with_env();
    overrides.dictionary = common.dictionary.clone();
    overrides.no_redact = common.no_redact;
    Ok(Settings::resolve(config, overrides))
}

pub fn build_pipeline(settings: &Settings) -> Result<SummaryPipeline> {
    let pipeline = match &settings.dictionary {
        Some(path) => SummaryPipeline::from_dictionary_path(path)
            .with_context(|| format!("failed to load dictionary {}", path.display()))?,
        None => SummaryPipeline::default(),
    };
    Ok(pipeline.with_redaction(settings.redact_identifiers))
}
