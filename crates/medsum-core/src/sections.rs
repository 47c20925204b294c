//! Splits a report into its labelled sections (`Chief complaint:`,
//! `Assessment:`, `Plan:` ...). Works on the raw line structure, before the
//! normalizer flattens it.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::text::collapse_whitespace;

pub const SECTION_HEADERS: &[&str] = &[
    "chief complaint",
    "history of present illness",
    "past medical history",
    "medications",
    "allergies",
    "social history",
    "family history",
    "review of systems",
    "physical examination",
    "assessment",
    "plan",
    "discharge summary",
    "impression",
    "recommendations",
    "procedures",
    "laboratory results",
    "imaging",
    "vital signs",
];

/// A header at the start of a line, followed by `:` or the end of the line.
static HEADER: LazyLock<regex::Regex> = LazyLock::new(|| {
    let mut headers: Vec<&str> = SECTION_HEADERS.to_vec();
    headers.sort_by_key(|h| std::cmp::Reverse(h.len()));
    let alternation = headers
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");
    regex::Regex::new(&format!(r"(?i)^[ \t]*({alternation})[ \t]*(?::|$)"))
        .expect("valid section header regex")
});

/// Section header (lowercase) -> section body with whitespace collapsed.
/// Only the first occurrence of each header is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sections(BTreeMap<String, String>);

impl Sections {
    pub fn extract(text: &str) -> Self {
        let mut sections = BTreeMap::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if let Some(caps) = HEADER.captures(line) {
                if let Some((name, body)) = current.take() {
                    insert_section(&mut sections, name, &body);
                }
                let rest = &line[caps[0].len()..];
                current = Some((caps[1].to_lowercase(), rest.to_string()));
            } else if let Some((_, body)) = current.as_mut() {
                body.push('\n');
                body.push_str(line);
            }
        }
        if let Some((name, body)) = current {
            insert_section(&mut sections, name, &body);
        }

        Self(sections)
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.0.get(&header.to_lowercase()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn insert_section(sections: &mut BTreeMap<String, String>, name: String, body: &str) {
    let body = collapse_whitespace(body);
    if !body.is_empty() {
        sections.entry(name).or_insert(body);
    }
}
