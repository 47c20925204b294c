use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DictionaryError;

/// Where a candidate expansion is allowed to apply, judged from the tokens
/// around the abbreviation inside its sentence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionContext {
    #[default]
    Any,
    /// Previous token is a number (`10 mg`, `24 hr`).
    AfterNumber,
    /// Next token is a number (`K 4.2`, `Na 138`).
    BeforeNumber,
}

impl ExpansionContext {
    pub fn holds(self, previous_is_number: bool, next_is_number: bool) -> bool {
        match self {
            Self::Any => true,
            Self::AfterNumber => previous_is_number,
            Self::BeforeNumber => next_is_number,
        }
    }
}

/// The tokens around an abbreviation inside its sentence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Neighbours<'a> {
    /// Previous word with surrounding punctuation removed.
    pub previous_word: Option<&'a str>,
    pub previous_is_number: bool,
    pub next_is_number: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub phrase: String,
    #[serde(default)]
    pub context: ExpansionContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Words that block this candidate when they come right before the
    /// abbreviation (`vitamin K` is not potassium).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_after: Vec<String>,
}

impl Expansion {
    #[must_use]
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            context: ExpansionContext::Any,
            priority: None,
            not_after: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: ExpansionContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_not_after(mut self, words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.not_after = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn applies(&self, neighbours: &Neighbours<'_>) -> bool {
        let blocked = neighbours
            .previous_word
            .is_some_and(|word| self.not_after.iter().any(|w| w.eq_ignore_ascii_case(word)));
        !blocked
            && self
                .context
                .holds(neighbours.previous_is_number, neighbours.next_is_number)
    }
}

/// One abbreviation and its candidate expansions, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbreviationEntry {
    pub abbreviation: String,
    pub expansions: Vec<Expansion>,
    pub note: Option<String>,
}

impl AbbreviationEntry {
    pub fn is_ambiguous(&self) -> bool {
        self.expansions.len() > 1
    }

    /// First candidate, in priority order, that applies between these
    /// neighbours.
    pub fn resolve(&self, neighbours: &Neighbours<'_>) -> Option<&Expansion> {
        self.expansions.iter().find(|e| e.applies(neighbours))
    }
}

/// Uppercase abbreviation -> expansion candidates. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct AbbreviationTable {
    entries: HashMap<String, AbbreviationEntry>,
    order: Vec<String>,
}

impl AbbreviationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry. Candidates are ordered by explicit `priority`, falling
    /// back to their declaration position; equal priorities keep declaration
    /// order.
    pub fn insert(
        &mut self,
        abbreviation: &str,
        expansions: Vec<Expansion>,
        note: Option<String>,
    ) -> Result<(), DictionaryError> {
        let key = abbreviation.trim().to_uppercase();
        if key.is_empty() {
            return Err(DictionaryError::EmptyAbbreviation);
        }
        if expansions.is_empty() || expansions.iter().any(|e| e.phrase.trim().is_empty()) {
            return Err(DictionaryError::EmptyExpansion(key));
        }
        if self.entries.contains_key(&key) {
            return Err(DictionaryError::DuplicateAbbreviation(key));
        }

        let mut ranked: Vec<(u32, Expansion)> = expansions
            .into_iter()
            .enumerate()
            .map(|(i, e)| (e.priority.unwrap_or(i as u32), e))
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);

        let entry = AbbreviationEntry {
            abbreviation: key.clone(),
            expansions: ranked.into_iter().map(|(_, e)| e).collect(),
            note,
        };

        self.order.push(key.clone());
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Case-insensitive exact lookup.
    pub fn get(&self, token: &str) -> Option<&AbbreviationEntry> {
        self.entries.get(&token.to_uppercase())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AbbreviationEntry> {
        self.order.iter().filter_map(|k| self.entries.get(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
