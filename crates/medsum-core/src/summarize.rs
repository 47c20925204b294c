use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::{Category, Dictionary};
use crate::findings::KeyFindings;
use crate::normalize::{NormalizedDocument, Sentence};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    #[error("No sentence matched the selected categories")]
    NoContentSelected,
}

pub type SummarizeResult<T> = Result<T, SummarizeError>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    const LONGEST: usize = 10;

    /// Upper bound on selected sentences.
    #[must_use]
    pub fn limit(&self) -> usize {
        match self {
            Self::Short => 3,
            Self::Medium => 6,
            Self::Long => Self::LONGEST,
        }
    }

    /// Number of sentences to keep from a document of `total` sentences.
    /// Shorter documents get a proportional share, never less than one.
    #[must_use]
    pub fn target(&self, total: usize) -> usize {
        let proportional = (total * self.limit()).div_ceil(Self::LONGEST);
        proportional.min(self.limit()).max(1)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown summary length '{0}' (expected short, medium or long)")]
pub struct ParseLengthError(String);

impl FromStr for SummaryLength {
    type Err = ParseLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(ParseLengthError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub length: SummaryLength,
    pub include_categories: BTreeSet<Category>,
}

impl SummaryOptions {
    #[must_use]
    pub fn new(length: SummaryLength) -> Self {
        Self {
            length,
            include_categories: Category::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.include_categories = categories.into_iter().collect();
        self
    }
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self::new(SummaryLength::default())
    }
}

/// Why a sentence was kept: its position, total weight and the included
/// categories it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceScore {
    pub index: usize,
    pub score: u32,
    pub categories: BTreeSet<Category>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub clinical_text: String,
    pub patient_text: String,
    pub included_sentence_count: usize,
    pub selected: Vec<SentenceScore>,
    pub findings: KeyFindings,
}

/// Scores sentences against the dictionary's patterns and renders the
/// clinical and patient variants.
#[derive(Debug, Clone)]
pub struct Summarizer {
    dictionary: Arc<Dictionary>,
}

impl Summarizer {
    #[must_use]
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    /// Sum of the weights of every matched pattern in an included category.
    pub fn score(&self, sentence: &Sentence, include: &BTreeSet<Category>) -> SentenceScore {
        let mut score = SentenceScore {
            index: sentence.index,
            score: 0,
            categories: BTreeSet::new(),
            patterns: Vec::new(),
        };

        for pattern in &self.dictionary.patterns {
            if !include.contains(&pattern.category) || !pattern.matches(&sentence.text) {
                continue;
            }
            score.score = score.score.saturating_add(pattern.weight);
            score.categories.insert(pattern.category);
            score.patterns.push(pattern.name.clone());
        }

        score
    }

    pub fn summarize(
        &self,
        document: &NormalizedDocument,
        options: &SummaryOptions,
    ) -> SummarizeResult<SummaryResult> {
        // Positions, not the stored `Sentence::index`, so a deserialized
        // document cannot point outside its own sentence list.
        let mut candidates: Vec<SentenceScore> = document
            .iter()
            .enumerate()
            .map(|(position, sentence)| SentenceScore {
                index: position,
                ..self.score(sentence, &options.include_categories)
            })
            .filter(|s| s.score > 0)
            .collect();

        if candidates.is_empty() {
            tracing::debug!(
                sentences = document.len(),
                categories = ?options.include_categories,
                "No sentence scored above zero"
            );
            return Err(SummarizeError::NoContentSelected);
        }

        let target = options.length.target(document.len());
        candidates.sort_by(|a, b| b.score.cmp(&a.score).then(a.index.cmp(&b.index)));
        candidates.truncate(target);
        candidates.sort_by_key(|s| s.index);

        let chosen: Vec<&Sentence> = candidates
            .iter()
            .filter_map(|s| document.sentences().get(s.index))
            .collect();

        let clinical_text = chosen
            .iter()
            .map(|s| s.annotated())
            .collect::<Vec<_>>()
            .join(" ");

        let patient_text = chosen
            .iter()
            .map(|s| self.dictionary.lay_terms.simplify(&s.text))
            .collect::<Vec<_>>()
            .join(" ");

        let mut findings = KeyFindings::extract(document);
        findings.retain_categories(&options.include_categories);

        tracing::debug!(
            length = %options.length,
            target,
            selected = candidates.len(),
            "Selected sentences"
        );

        Ok(SummaryResult {
            clinical_text,
            patient_text,
            included_sentence_count: candidates.len(),
            selected: candidates,
            findings,
        })
    }
}
