use std::collections::HashMap;

use regex::{Captures, Regex};

use super::DictionaryError;
use crate::text::capitalize_first;

/// Clinical term -> plain-language replacement, applied in a single pass.
///
/// All terms are folded into one alternation (longest first) so a replacement
/// is never itself re-matched, and overlapping terms such as `CT scan` and
/// `scan` resolve to the longer one.
#[derive(Debug, Clone)]
pub struct LayTermTable {
    terms: Vec<(String, String)>,
    lookup: HashMap<String, usize>,
    regex: Option<Regex>,
}

impl LayTermTable {
    pub fn new(terms: Vec<(String, String)>) -> Result<Self, DictionaryError> {
        let mut lookup = HashMap::new();
        for (i, (term, plain)) in terms.iter().enumerate() {
            if term.trim().is_empty() || plain.trim().is_empty() {
                return Err(DictionaryError::EmptyLayTerm(term.clone()));
            }
            if lookup.insert(term.trim().to_lowercase(), i).is_some() {
                return Err(DictionaryError::DuplicateLayTerm(term.clone()));
            }
        }

        let regex = if terms.is_empty() {
            None
        } else {
            let mut sorted: Vec<&str> = terms.iter().map(|(t, _)| t.trim()).collect();
            sorted.sort_by_key(|t| std::cmp::Reverse(t.len()));
            let alternation = sorted
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            let regex = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).map_err(|source| {
                DictionaryError::InvalidPattern {
                    name: "lay_terms".into(),
                    source,
                }
            })?;
            Some(regex)
        };

        Ok(Self {
            terms,
            lookup,
            regex,
        })
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.lookup
            .get(&term.to_lowercase())
            .map(|&i| self.terms[i].1.as_str())
    }

    /// Replaces every clinical term in `text`. A match starting with an
    /// uppercase letter gets a capitalised replacement.
    pub fn simplify(&self, text: &str) -> String {
        let Some(regex) = &self.regex else {
            return text.to_string();
        };

        regex
            .replace_all(text, |caps: &Captures<'_>| {
                let matched = &caps[0];
                let Some(plain) = self.get(matched) else {
                    return matched.to_string();
                };
                if matched.chars().next().is_some_and(char::is_uppercase) {
                    capitalize_first(plain)
                } else {
                    plain.to_string()
                }
            })
            .into_owned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(t, p)| (t.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
