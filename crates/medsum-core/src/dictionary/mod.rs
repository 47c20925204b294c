//! Static lookup tables: abbreviations, sentence patterns and lay terms.
//!
//! A [`Dictionary`] is deserialised from JSON once and never mutated. The
//! built-in one is embedded in the crate; custom ones are validated when they
//! are loaded, so a malformed table fails at startup rather than mid-request.

mod abbreviation;
mod lay_terms;
mod pattern;

use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use abbreviation::{
    AbbreviationEntry, AbbreviationTable, Expansion, ExpansionContext, Neighbours,
};
pub use lay_terms::LayTermTable;
pub use pattern::{Category, Matcher, ParseCategoryError, SentencePattern};

const BUILTIN_JSON: &str = include_str!("../../data/dictionary.json");

static BUILTIN: LazyLock<Arc<Dictionary>> = LazyLock::new(|| {
    Arc::new(Dictionary::from_json_str(BUILTIN_JSON).expect("built-in dictionary is valid"))
});

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dictionary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("Pattern '{0}' has nothing to match")]
    EmptyPattern(String),
    #[error("Pattern '{0}' needs exactly one of `regex` or `keywords`")]
    AmbiguousMatcher(String),
    #[error("Abbreviation with an empty key")]
    EmptyAbbreviation,
    #[error("Abbreviation {0} has an empty expansion")]
    EmptyExpansion(String),
    #[error("Duplicate abbreviation: {0}")]
    DuplicateAbbreviation(String),
    #[error("Lay term '{0}' is empty or has an empty replacement")]
    EmptyLayTerm(String),
    #[error("Duplicate lay term: {0}")]
    DuplicateLayTerm(String),
}

pub type DictionaryResult<T> = Result<T, DictionaryError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawExpansion {
    Phrase(String),
    Detailed(Expansion),
}

impl From<RawExpansion> for Expansion {
    fn from(raw: RawExpansion) -> Self {
        match raw {
            RawExpansion::Phrase(phrase) => Self::new(phrase),
            RawExpansion::Detailed(expansion) => expansion,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAbbreviation {
    abbreviation: String,
    expansions: Vec<RawExpansion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPattern {
    name: String,
    category: Category,
    weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLayTerm {
    term: String,
    plain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawDictionary {
    #[serde(default)]
    abbreviations: Vec<RawAbbreviation>,
    #[serde(default)]
    patterns: Vec<RawPattern>,
    #[serde(default)]
    lay_terms: Vec<RawLayTerm>,
}

/// The read-only tables the normalizer and summarizer work from.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub abbreviations: AbbreviationTable,
    pub patterns: Vec<SentencePattern>,
    pub lay_terms: LayTermTable,
}

impl Dictionary {
    /// The dictionary bundled with the crate, parsed on first use.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    pub fn from_json_str(json: &str) -> DictionaryResult<Self> {
        let raw: RawDictionary = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_path(path: &Path) -> DictionaryResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let dictionary = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            abbreviations = dictionary.abbreviations.len(),
            patterns = dictionary.patterns.len(),
            lay_terms = dictionary.lay_terms.len(),
            "Loaded dictionary"
        );
        Ok(dictionary)
    }

    fn from_raw(raw: RawDictionary) -> DictionaryResult<Self> {
        let mut abbreviations = AbbreviationTable::new();
        for entry in raw.abbreviations {
            let expansions = entry.expansions.into_iter().map(Expansion::from).collect();
            abbreviations.insert(&entry.abbreviation, expansions, entry.note)?;
        }

        let patterns = raw
            .patterns
            .into_iter()
            .map(|p| match (p.regex, p.keywords) {
                (Some(regex), None) => {
                    SentencePattern::from_regex(&p.name, &regex, p.category, p.weight)
                }
                (None, Some(keywords)) => {
                    SentencePattern::from_keywords(&p.name, keywords, p.category, p.weight)
                }
                _ => Err(DictionaryError::AmbiguousMatcher(p.name)),
            })
            .collect::<DictionaryResult<Vec<_>>>()?;

        for pattern in patterns.iter().filter(|p| p.weight == 0) {
            tracing::warn!(pattern = %pattern.name, "Pattern has zero weight and never scores");
        }

        let lay_terms =
            LayTermTable::new(raw.lay_terms.into_iter().map(|t| (t.term, t.plain)).collect())?;

        Ok(Self {
            abbreviations,
            patterns,
            lay_terms,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_dictionary_parses() {
        let dict = Dictionary::builtin();
        assert!(dict.abbreviations.len() >= 40);
        assert!(!dict.patterns.is_empty());
        assert!(!dict.lay_terms.is_empty());
        for category in Category::ALL {
            assert!(
                dict.patterns.iter().any(|p| p.category == category),
                "no pattern for {category}"
            );
        }
    }

    #[test]
    fn builtin_expansions_never_contain_keys() {
        let dict = Dictionary::builtin();
        let keys: HashSet<String> = dict
            .abbreviations
            .iter()
            .map(|e| e.abbreviation.clone())
            .collect();

        for entry in dict.abbreviations.iter() {
            for expansion in &entry.expansions {
                for word in expansion.phrase.split(' ') {
                    let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
                    assert!(
                        !keys.contains(&word.to_uppercase()),
                        "{} expands to '{}' which contains key {word}",
                        entry.abbreviation,
                        expansion.phrase
                    );
                }
            }
        }
    }

    #[test]
    fn builtin_ambiguous_entries_are_documented() {
        let dict = Dictionary::builtin();
        for entry in dict.abbreviations.iter().filter(|e| e.is_ambiguous()) {
            assert!(entry.note.is_some(), "{} lacks a note", entry.abbreviation);
        }
    }

    #[test]
    fn accepts_short_and_detailed_expansions() {
        let dict = Dictionary::from_json_str(
            r#"{
                "abbreviations": [
                    {"abbreviation": "pt", "expansions": ["patient"]},
                    {"abbreviation": "mg", "expansions": [
                        {"phrase": "milligrams", "context": "after_number"},
                        "magnesium"
                    ], "note": "unit after numbers"}
                ]
            }"#,
        )
        .unwrap();

        let mg = dict.abbreviations.get("MG").unwrap();
        assert_eq!(mg.expansions[0].context, ExpansionContext::AfterNumber);
        assert_eq!(mg.expansions[1].phrase, "magnesium");
        assert!(dict.patterns.is_empty());
    }

    #[test]
    fn pattern_needs_one_matcher() {
        let err = Dictionary::from_json_str(
            r#"{"patterns": [{"name": "both", "category": "vital", "weight": 1,
                "regex": "x", "keywords": ["y"]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DictionaryError::AmbiguousMatcher(_)));

        let err = Dictionary::from_json_str(
            r#"{"patterns": [{"name": "none", "category": "vital", "weight": 1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DictionaryError::AmbiguousMatcher(_)));
    }

    #[test]
    fn unknown_category_is_a_json_error() {
        let err = Dictionary::from_json_str(
            r#"{"patterns": [{"name": "x", "category": "imaging", "weight": 1, "regex": "x"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DictionaryError::Json(_)));
    }

    #[test]
    fn loads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.json");
        std::fs::write(
            &path,
            r#"{"lay_terms": [{"term": "edema", "plain": "swelling"}]}"#,
        )
        .unwrap();

        let dict = Dictionary::from_path(&path).unwrap();
        assert_eq!(dict.lay_terms.get("Edema"), Some("swelling"));
        assert!(dict.abbreviations.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Dictionary::from_path(Path::new("/nonexistent/dict.json")).unwrap_err();
        assert!(matches!(err, DictionaryError::Io(_)));
    }
}
