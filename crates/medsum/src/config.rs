use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use medsum_core::{Category, SummaryLength, SummaryOptions};

pub const DICTIONARY_ENV: &str = "MEDSUM_DICTIONARY";

/// User configuration, read from `config.json`. Every key is optional;
/// command-line flags win over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub length: Option<SummaryLength>,
    pub include: Option<Vec<Category>>,
    pub dictionary: Option<PathBuf>,
    pub redact_identifiers: Option<bool>,
}

impl AppConfig {
    /// `$CONFIG_DIR/medsum/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("medsum").join("config.json"))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// An explicit path must exist. The default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Using config file");
                Self::from_path(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(path) = std::env::var_os(DICTIONARY_ENV).filter(|v| !v.is_empty()) {
            self.dictionary = Some(PathBuf::from(path));
        }
        self
    }
}

/// Flag values that take precedence over [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub length: Option<SummaryLength>,
    pub include: Vec<Category>,
    pub dictionary: Option<PathBuf>,
    pub no_redact: bool,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub options: SummaryOptions,
    pub dictionary: Option<PathBuf>,
    pub redact_identifiers: bool,
}

impl Settings {
    pub fn resolve(config: AppConfig, overrides: Overrides) -> Self {
        let length = overrides.length.or(config.length).unwrap_or_default();
        let mut options = SummaryOptions::new(length);

        let include = Some(overrides.include)
            .filter(|flags| !flags.is_empty())
            .or(config.include);
        if let Some(include) = include {
            options = options.with_categories(include);
        }

        Self {
            options,
            dictionary: overrides.dictionary.or(config.dictionary),
            redact_identifiers: !overrides.no_redact && config.redact_identifiers.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config: AppConfig =
            serde_json::from_str(r#"{"length": "short", "include": ["vital", "diagnosis"]}"#)
                .unwrap();
        assert_eq!(config.length, Some(SummaryLength::Short));
        assert_eq!(
            config.include,
            Some(vec![Category::Vital, Category::Diagnosis])
        );
        assert_eq!(config.dictionary, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(serde_json::from_str::<AppConfig>(r#"{"lenght": "short"}"#).is_err());
    }

    #[test]
    fn defaults_without_config_or_flags() {
        let settings = Settings::resolve(AppConfig::default(), Overrides::default());
        assert_eq!(settings.options, SummaryOptions::default());
        assert!(settings.redact_identifiers);
        assert_eq!(settings.dictionary, None);
    }

    #[test]
    fn flags_override_config() {
        let config = AppConfig {
            length: Some(SummaryLength::Long),
            include: Some(vec![Category::Medication]),
            dictionary: Some(PathBuf::from("config.json")),
            redact_identifiers: Some(true),
        };
        let overrides = Overrides {
            length: Some(SummaryLength::Short),
            include: vec![Category::Vital],
            dictionary: Some(PathBuf::from("flag.json")),
            no_redact: true,
        };

        let settings = Settings::resolve(config, overrides);
        assert_eq!(settings.options.length, SummaryLength::Short);
        assert_eq!(
            settings.options.include_categories.iter().copied().collect::<Vec<_>>(),
            vec![Category::Vital]
        );
        assert_eq!(settings.dictionary, Some(PathBuf::from("flag.json")));
        assert!(!settings.redact_identifiers);
    }

    #[test]
    fn config_fills_missing_flags() {
        let config = AppConfig {
            length: Some(SummaryLength::Long),
            include: Some(vec![Category::Procedure]),
            dictionary: None,
            redact_identifiers: Some(false),
        };
        let settings = Settings::resolve(config, Overrides::default());
        assert_eq!(settings.options.length, SummaryLength::Long);
        assert!(settings.options.include_categories.contains(&Category::Procedure));
        assert_eq!(settings.options.include_categories.len(), 1);
        assert!(!settings.redact_identifiers);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/definitely/missing.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn loads_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"redact_identifiers": false}"#).unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.redact_identifiers, Some(false));
    }
}
