use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DictionaryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Medication,
    Procedure,
    Recommendation,
    Diagnosis,
    Vital,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Medication,
        Self::Procedure,
        Self::Recommendation,
        Self::Diagnosis,
        Self::Vital,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medication => "medication",
            Self::Procedure => "procedure",
            Self::Recommendation => "recommendation",
            Self::Diagnosis => "diagnosis",
            Self::Vital => "vital",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{name}'{hint}")]
pub struct ParseCategoryError {
    pub name: String,
    hint: String,
}

impl ParseCategoryError {
    fn new(name: &str) -> Self {
        let suggestion = Category::ALL
            .iter()
            .map(|c| (c, strsim::jaro_winkler(name, c.as_str())))
            .filter(|(_, score)| *score >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c.as_str());

        Self {
            name: name.to_string(),
            hint: suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)")),
        }
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medication" | "medications" => Ok(Self::Medication),
            "procedure" | "procedures" => Ok(Self::Procedure),
            "recommendation" | "recommendations" => Ok(Self::Recommendation),
            "diagnosis" | "diagnoses" => Ok(Self::Diagnosis),
            "vital" | "vitals" => Ok(Self::Vital),
            other => Err(ParseCategoryError::new(other)),
        }
    }
}

/// How a pattern recognises a sentence. Keyword sets are compiled into one
/// case-insensitive, word-bounded alternation.
#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    Keywords { keywords: Vec<String>, regex: Regex },
}

impl Matcher {
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Regex(Regex::new(pattern)?))
    }

    pub fn keywords(keywords: Vec<String>) -> Result<Self, regex::Error> {
        let mut sorted: Vec<&String> = keywords.iter().collect();
        sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));
        let alternation = sorted
            .iter()
            .map(|k| regex::escape(k.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?;
        Ok(Self::Keywords { keywords, regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Regex(regex) | Self::Keywords { regex, .. } => regex.is_match(text),
        }
    }

    /// The keywords as written, or the regex source.
    pub fn describe(&self) -> String {
        match self {
            Self::Regex(regex) => regex.as_str().to_string(),
            Self::Keywords { keywords, .. } => keywords.join(", "),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentencePattern {
    pub name: String,
    pub matcher: Matcher,
    pub category: Category,
    pub weight: u32,
}

impl SentencePattern {
    pub fn from_regex(
        name: &str,
        pattern: &str,
        category: Category,
        weight: u32,
    ) -> Result<Self, DictionaryError> {
        let matcher = Matcher::regex(pattern).map_err(|source| DictionaryError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            matcher,
            category,
            weight,
        })
    }

    pub fn from_keywords(
        name: &str,
        keywords: Vec<String>,
        category: Category,
        weight: u32,
    ) -> Result<Self, DictionaryError> {
        if keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(DictionaryError::EmptyPattern(name.to_string()));
        }
        let keywords: Vec<String> = keywords.into_iter().filter(|k| !k.trim().is_empty()).collect();
        let matcher =
            Matcher::keywords(keywords).map_err(|source| DictionaryError::InvalidPattern {
                name: name.to_string(),
                source,
            })?;
        Ok(Self {
            name: name.to_string(),
            matcher,
            category,
            weight,
        })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}
