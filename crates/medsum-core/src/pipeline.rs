use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::dictionary::{Dictionary, DictionaryError};
use crate::loader::{self, LoadError, LoadedDocument};
use crate::normalize::{NormalizeError, NormalizedDocument, TextNormalizer};
use crate::summarize::{SummarizeError, Summarizer, SummaryOptions, SummaryResult};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub input_words: usize,
    pub sentences: usize,
    pub selected: usize,
    pub expansions: usize,
    pub redactions: usize,
    pub duration_ms: u64,
}

impl PipelineStats {
    /// Share of sentences that made it into the summary.
    pub fn selection_ratio(&self) -> f64 {
        if self.sentences == 0 {
            return 0.0;
        }
        self.selected as f64 / self.sentences as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub title: Option<String>,
    pub document: NormalizedDocument,
    pub summary: SummaryResult,
    pub stats: PipelineStats,
}

/// raw text -> [`TextNormalizer`] -> [`Summarizer`]. Holds no per-request
/// state, so one pipeline can serve any number of calls.
#[derive(Debug, Clone)]
pub struct SummaryPipeline {
    normalizer: TextNormalizer,
    summarizer: Summarizer,
}

impl SummaryPipeline {
    #[must_use]
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self {
            normalizer: TextNormalizer::new(Arc::clone(&dictionary)),
            summarizer: Summarizer::new(dictionary),
        }
    }

    pub fn from_dictionary_path(path: &Path) -> PipelineResult<Self> {
        let dictionary = Dictionary::from_path(path)?;
        Ok(Self::new(Arc::new(dictionary)))
    }

    #[must_use]
    pub fn with_redaction(mut self, enabled: bool) -> Self {
        self.normalizer = self.normalizer.with_redaction(enabled);
        self
    }

    pub fn normalize(&self, text: &str) -> PipelineResult<NormalizedDocument> {
        Ok(self.normalizer.normalize(text)?)
    }

    pub fn summarize(
        &self,
        document: &NormalizedDocument,
        options: &SummaryOptions,
    ) -> PipelineResult<SummaryResult> {
        Ok(self.summarizer.summarize(document, options)?)
    }

    pub fn run(&self, text: &str, options: &SummaryOptions) -> PipelineResult<PipelineOutput> {
        self.run_loaded(
            LoadedDocument {
                format: loader::DocumentFormat::PlainText,
                title: None,
                text: text.to_string(),
            },
            options,
        )
    }

    pub fn run_file(&self, path: &Path, options: &SummaryOptions) -> PipelineResult<PipelineOutput> {
        let loaded = loader::load_file(path)?;
        self.run_loaded(loaded, options)
    }

    /// Runs a document the caller has already loaded, keeping its title.
    pub fn run_loaded(
        &self,
        loaded: LoadedDocument,
        options: &SummaryOptions,
    ) -> PipelineResult<PipelineOutput> {
        let start = Instant::now();

        let document = self.normalizer.normalize(&loaded.text)?;
        let summary = self.summarizer.summarize(&document, options)?;

        let stats = PipelineStats {
            input_words: loaded.text.split_whitespace().count(),
            sentences: document.len(),
            selected: summary.included_sentence_count,
            expansions: document.expansion_count(),
            redactions: document.redaction_count(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        tracing::info!(
            sentences = stats.sentences,
            selected = stats.selected,
            expansions = stats.expansions,
            redactions = stats.redactions,
            duration_ms = stats.duration_ms,
            "Summarized report"
        );

        Ok(PipelineOutput {
            title: loaded.title,
            document,
            summary,
            stats,
        })
    }
}

impl Default for SummaryPipeline {
    fn default() -> Self {
        Self::new(Dictionary::builtin())
    }
}
