#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod dictionary;
pub mod findings;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod sections;
pub mod summarize;
pub mod text;

pub use dictionary::{Category, Dictionary, DictionaryError, ParseCategoryError};
pub use findings::{KeyFindings, VitalSign};
pub use loader::{DocumentFormat, LoadError, LoadedDocument};
pub use normalize::{NormalizeError, NormalizedDocument, Sentence, TextNormalizer};
pub use pipeline::{PipelineError, PipelineOutput, PipelineResult, PipelineStats, SummaryPipeline};
pub use sections::Sections;
pub use summarize::{
    ParseLengthError, SentenceScore, SummarizeError, Summarizer, SummaryLength, SummaryOptions,
    SummaryResult,
};
