use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::{Dictionary, Neighbours};
use crate::sections::Sections;
use crate::text::{collapse_whitespace, looks_numeric, strip_non_printable, tidy_punctuation, CaseShape};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Input text is empty")]
    EmptyInput,
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Titles whose period never ends a sentence.
const TITLES: &[&str] = &["dr", "mr", "mrs", "ms", "prof", "st", "sr", "jr"];

/// Abbreviations whose period ends a sentence only when the next token is
/// capitalised (`10 mg. daily` vs `10 mg. Patient stable`).
const PERIOD_ABBREVIATIONS: &[&str] = &[
    "mg", "mcg", "ml", "kg", "tab", "tabs", "cap", "caps", "approx", "vs", "e.g", "i.e", "etc",
    "no", "fig", "min", "hrs",
];

const LEADING_PUNCTUATION: &[char] = &['(', '[', '"', '\''];
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];
const CLOSING_BRACKETS: &[char] = &[')', ']', '"', '\''];
const CLAUSE_BREAKS: &[char] = &[',', ';', ':', '.', '!', '?'];

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("valid paragraph regex"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:[-*•]|\d{1,2}[.)])[ \t]+").expect("valid bullet regex"));

static IDENTIFIERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b\d{3}-\d{2}-\d{4}\b", "[SSN]"),
        (r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b", "[PHONE]"),
        (r"\b\d{1,2}/\d{1,2}/\d{4}\b", "[DATE]"),
        (r"(?i)\bMRN:?\s*\d+\b", "[MRN]"),
    ]
    .into_iter()
    .map(|(pattern, placeholder)| (Regex::new(pattern).expect("valid identifier regex"), placeholder))
    .collect()
});

/// An abbreviation replaced inside a sentence. `start..end` is the byte range
/// of the expansion within [`Sentence::text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedExpansion {
    pub original: String,
    pub expansion: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
    pub expansions: Vec<AppliedExpansion>,
}

impl Sentence {
    /// The sentence with each expansion followed by its source abbreviation:
    /// `Patient (Pt) complains of (c/o) ...`.
    pub fn annotated(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + self.expansions.len() * 8);
        let mut cursor = 0;
        for expansion in &self.expansions {
            out.push_str(&self.text[cursor..expansion.end]);
            out.push_str(" (");
            out.push_str(&expansion.original);
            out.push(')');
            cursor = expansion.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    sentences: Vec<Sentence>,
    redactions: usize,
    #[serde(default)]
    sections: Sections,
}

impl NormalizedDocument {
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.iter()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// All sentences joined by single spaces.
    pub fn text(&self) -> String {
        self.sentences
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn expansion_count(&self) -> usize {
        self.sentences.iter().map(|s| s.expansions.len()).sum()
    }

    pub fn redaction_count(&self) -> usize {
        self.redactions
    }

    /// Labelled sections of the (redacted) source text.
    pub fn sections(&self) -> &Sections {
        &self.sections
    }
}

/// Cleans raw report text into sentences with abbreviations expanded.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    dictionary: Arc<Dictionary>,
    redact_identifiers: bool,
}

impl TextNormalizer {
    #[must_use]
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self {
            dictionary,
            redact_identifiers: true,
        }
    }

    #[must_use]
    pub fn with_redaction(mut self, enabled: bool) -> Self {
        self.redact_identifiers = enabled;
        self
    }

    pub fn normalize(&self, raw: &str) -> NormalizeResult<NormalizedDocument> {
        let cleaned = strip_non_printable(raw);
        if cleaned.trim().is_empty() {
            return Err(NormalizeError::EmptyInput);
        }

        let (cleaned, redactions) = if self.redact_identifiers {
            redact(&cleaned)
        } else {
            (cleaned, 0)
        };

        let sections = Sections::extract(&cleaned);

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut heading: Vec<String> = Vec::new();

        for segment in segments(&cleaned) {
            let flat = tidy_punctuation(&collapse_whitespace(&segment));
            if flat.is_empty() {
                continue;
            }

            let mut tokens = std::mem::take(&mut heading);
            tokens.extend(flat.split(' ').map(String::from));

            let mut split = split_sentences(tokens);
            let ends_with_colon = split
                .last()
                .and_then(|g| g.last())
                .is_some_and(|t| t.ends_with(':'));
            if ends_with_colon {
                heading = split.pop().unwrap_or_default();
            }
            groups.extend(split);
        }
        if !heading.is_empty() {
            groups.push(heading);
        }

        let sentences: Vec<Sentence> = groups
            .iter()
            .enumerate()
            .map(|(index, tokens)| self.build_sentence(index, tokens))
            .collect();

        let document = NormalizedDocument {
            sentences,
            redactions,
            sections,
        };

        tracing::debug!(
            sentences = document.len(),
            expansions = document.expansion_count(),
            redactions,
            sections = document.sections.len(),
            "Normalized document"
        );

        Ok(document)
    }

    fn build_sentence(&self, index: usize, tokens: &[String]) -> Sentence {
        let mut text = String::new();
        let mut expansions = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }

            let (lead, core, trail) = split_token(token);
            // A clause break (`150/90, HR`) separates a token from its neighbour.
            let previous = (i > 0)
                .then(|| tokens[i - 1].as_str())
                .filter(|t| !t.ends_with(CLAUSE_BREAKS));
            let neighbours = Neighbours {
                previous_word: previous.map(|t| split_token(t).1),
                previous_is_number: previous.is_some_and(looks_numeric),
                next_is_number: !trail.contains(CLAUSE_BREAKS)
                    && tokens.get(i + 1).is_some_and(|t| looks_numeric(t)),
            };

            let resolved = self
                .dictionary
                .abbreviations
                .get(core)
                .and_then(|entry| entry.resolve(&neighbours));

            let Some(candidate) = resolved else {
                text.push_str(token);
                continue;
            };

            let phrase = CaseShape::of(core).apply(&candidate.phrase);
            tracing::trace!(abbreviation = core, expansion = %phrase, "Expanded abbreviation");

            text.push_str(lead);
            let start = text.len();
            text.push_str(&phrase);
            let end = text.len();
            text.push_str(trail);

            expansions.push(AppliedExpansion {
                original: core.to_string(),
                expansion: phrase,
                start,
                end,
            });
        }

        terminate(&mut text);

        Sentence {
            index,
            text,
            expansions,
        }
    }
}

fn redact(text: &str) -> (String, usize) {
    let mut out = text.to_string();
    let mut count = 0;
    for (regex, placeholder) in IDENTIFIERS.iter() {
        count += regex.find_iter(&out).count();
        out = regex.replace_all(&out, *placeholder).into_owned();
    }
    (out, count)
}

/// Splits text into blocks that always end a sentence: paragraphs separated
/// by blank lines, and individual bullet-list items.
fn segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let mut current = String::new();
        for line in paragraph.lines() {
            if let Some(marker) = BULLET.find(line) {
                if !current.trim().is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                current.clear();
                current.push_str(&line[marker.end()..]);
            } else {
                current.push('\n');
                current.push_str(line);
            }
        }
        if !current.trim().is_empty() {
            segments.push(current);
        }
    }

    segments
}

fn split_sentences(tokens: Vec<String>) -> Vec<Vec<String>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    let count = tokens.len();

    for (i, token) in tokens.iter().enumerate() {
        current.push(token.clone());
        let previous = i.checked_sub(1).map(|p| tokens[p].as_str());
        let next = tokens.get(i + 1).map(String::as_str);
        if i + 1 < count && ends_sentence(previous, token, next) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

fn ends_sentence(previous: Option<&str>, token: &str, next: Option<&str>) -> bool {
    let trimmed = token.trim_end_matches(CLOSING_BRACKETS);
    match trimmed.chars().last() {
        Some('!' | '?') => true,
        Some('.') => {
            let word = trimmed
                .trim_end_matches('.')
                .trim_start_matches(LEADING_PUNCTUATION)
                .to_lowercase();

            if TITLES.contains(&word.as_str()) || is_initial(&word, previous) {
                false
            } else if PERIOD_ABBREVIATIONS.contains(&word.as_str()) {
                next.is_some_and(starts_uppercase)
            } else {
                true
            }
        }
        _ => false,
    }
}

/// A lone letter is a name initial only after a title, a capitalised word or
/// at the start of a sentence (`Dr. J. Smith`, `John F. Kennedy`). After a
/// lowercase word (`hepatitis B.`) it ends the sentence like any other token.
fn is_initial(word: &str, previous: Option<&str>) -> bool {
    let mut chars = word.chars();
    let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
    single_letter && previous.is_none_or(|p| starts_uppercase(p) || p.ends_with(['.', '!', '?']))
}

fn starts_uppercase(token: &str) -> bool {
    token
        .trim_start_matches(LEADING_PUNCTUATION)
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}

/// Splits surrounding punctuation off a token: `(SOB),` -> (`(`, `SOB`, `),`).
/// Slashes are part of the core so `w/` and `c/o` survive.
fn split_token(token: &str) -> (&str, &str, &str) {
    let without_lead = token.trim_start_matches(LEADING_PUNCTUATION);
    let lead = &token[..token.len() - without_lead.len()];
    let core = without_lead.trim_end_matches(TRAILING_PUNCTUATION);
    if core.is_empty() {
        return ("", token, "");
    }
    let trail = &without_lead[core.len()..];
    (lead, core, trail)
}

/// Makes sure the sentence ends with `.`, `!` or `?`. A dangling `,` `;` or
/// `:` is replaced rather than followed.
fn terminate(text: &mut String) {
    match text.chars().last() {
        Some('.' | '!' | '?') | None => {}
        Some(',' | ';' | ':') => {
            text.pop();
            text.push('.');
        }
        Some(_) => text.push('.'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(Dictionary::builtin())
    }

    #[test]
    fn expands_abbreviations_with_case() {
        let doc = normalizer()
            .normalize("Pt c/o SOB, started on lisinopril 10mg.")
            .unwrap();

        assert_eq!(doc.len(), 1);
        assert_eq!(
            doc.text(),
            "Patient complains of Shortness Of Breath, started on lisinopril 10mg."
        );
        let originals: Vec<_> = doc.sentences()[0]
            .expansions
            .iter()
            .map(|e| e.original.as_str())
            .collect();
        assert_eq!(originals, vec!["Pt", "c/o", "SOB"]);
    }

    #[test]
    fn annotated_sentence_keeps_abbreviations() {
        let doc = normalizer()
            .normalize("Pt c/o SOB, started on lisinopril 10mg.")
            .unwrap();
        assert_eq!(
            doc.sentences()[0].annotated(),
            "Patient (Pt) complains of (c/o) Shortness Of Breath (SOB), started on lisinopril 10mg."
        );
    }

    #[test]
    fn empty_and_blank_input_fail() {
        assert_eq!(normalizer().normalize(""), Err(NormalizeError::EmptyInput));
        assert_eq!(normalizer().normalize(" \n\t "), Err(NormalizeError::EmptyInput));
        assert_eq!(
            normalizer().normalize("\u{200B}\u{0007}"),
            Err(NormalizeError::EmptyInput)
        );
    }

    #[test]
    fn splits_sentences_but_not_titles() {
        let doc = normalizer()
            .normalize("Seen by Dr. Smith today. Pain improved! Any fever? None.")
            .unwrap();
        let texts: Vec<_> = doc.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Seen by Dr. Smith today.", "Pain improved!", "Any fever?", "None."]
        );
    }

    #[test]
    fn unit_period_needs_capital_to_break() {
        let doc = normalizer()
            .normalize("Aspirin 81 mg. daily with food. Dose was 5 mg. Patient stable.")
            .unwrap();
        let texts: Vec<_> = doc.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Aspirin 81 milligrams. daily with food.",
                "Dose was 5 milligrams.",
                "Patient stable.",
            ]
        );
    }

    #[test]
    fn context_picks_between_candidates() {
        let doc = normalizer()
            .normalize("Mg low, given 400 mg PO. K 3.1 noted. Vitamin K given.")
            .unwrap();
        assert_eq!(
            doc.text(),
            "Magnesium low, given 400 milligrams By Mouth. Potassium 3.1 noted. Vitamin K given."
        );
    }

    #[test]
    fn collapses_whitespace_and_noise() {
        let doc = normalizer()
            .normalize("  Chest   pain\u{0000} ,\t worse at night !!  ")
            .unwrap();
        assert_eq!(doc.text(), "Chest pain, worse at night!");
    }

    #[test]
    fn blank_lines_and_bullets_end_sentences() {
        let doc = normalizer()
            .normalize("Stable overnight\n\nMedications:\n- aspirin 81 mg daily\n- metoprolol 25 mg bid")
            .unwrap();
        let texts: Vec<_> = doc.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Stable overnight.",
                "Medications: aspirin 81 milligrams daily.",
                "metoprolol 25 milligrams twice daily.",
            ]
        );
    }

    #[test]
    fn trailing_heading_becomes_sentence() {
        let doc = normalizer().normalize("Plan:").unwrap();
        assert_eq!(doc.text(), "Plan.");
    }

    #[test]
    fn redacts_identifiers() {
        let doc = normalizer()
            .normalize("MRN: 448812. SSN 123-45-6789, call 555-123-4567 on 3/14/2024.")
            .unwrap();
        assert_eq!(doc.text(), "[MRN]. SSN [SSN], call [PHONE] on [DATE].");
        assert_eq!(doc.redaction_count(), 4);
    }

    #[test]
    fn records_sections_after_redaction() {
        let doc = normalizer()
            .normalize("Chief complaint: CP since 3/14/2024
Plan:
ASA 81 mg daily.")
            .unwrap();
        assert_eq!(doc.sections().get("chief complaint"), Some("CP since [DATE]"));
        assert_eq!(doc.sections().get("plan"), Some("ASA 81 mg daily."));
    }

    #[test]
    fn redaction_can_be_disabled() {
        let doc = normalizer()
            .with_redaction(false)
            .normalize("Seen on 3/14/2024.")
            .unwrap();
        assert_eq!(doc.text(), "Seen on 3/14/2024.");
        assert_eq!(doc.redaction_count(), 0);
    }

    #[test]
    fn normalizing_twice_adds_no_expansions() {
        let raw = "Pt w/ hx of HTN. BP 150/90, HR 88, Temp 99.1. F/U in 2 wks. \
                   Mg 1.6, K 3.4. Rx: metoprolol 25 mg PO BID prn.";
        let once = normalizer().normalize(raw).unwrap();
        assert!(once.expansion_count() > 0);

        let twice = normalizer().normalize(&once.text()).unwrap();
        assert_eq!(twice.expansion_count(), 0);
        assert_eq!(twice.text(), once.text());
    }

    #[test]
    fn clause_break_hides_preceding_number() {
        let doc = normalizer().normalize("BP 150/90, HR 88. Monitor q 24 hr.").unwrap();
        assert_eq!(
            doc.text(),
            "Blood Pressure 150/90, Heart Rate 88. Monitor q 24 hours."
        );
    }

    #[test]
    fn non_empty_input_yields_a_sentence() {
        for raw in ["x", "...", "no punctuation here", "?!"] {
            let doc = normalizer().normalize(raw).unwrap();
            assert!(!doc.is_empty(), "{raw:?} produced no sentences");
        }
    }

    #[test]
    fn every_expansion_comes_from_the_table() {
        let dict = Dictionary::builtin();
        let doc = normalizer()
            .normalize("Pt on IV abx, f/u w/ PCP. WBC 14, Hgb 9.8, BUN 30, Cr 1.9.")
            .unwrap();
        for sentence in doc.iter() {
            for applied in &sentence.expansions {
                let entry = dict.abbreviations.get(&applied.original).unwrap();
                assert!(entry
                    .expansions
                    .iter()
                    .any(|e| e.phrase.eq_ignore_ascii_case(&applied.expansion)));
                assert_eq!(&sentence.text[applied.start..applied.end], applied.expansion);
            }
        }
    }

    #[test]
    fn dosed_vitamin_k_is_not_potassium() {
        let doc = normalizer()
            .normalize("Given vitamin K 10 mg IV. Repeat K 3.4 tomorrow.")
            .unwrap();
        assert_eq!(
            doc.text(),
            "Given vitamin K 10 milligrams Intravenous. Repeat Potassium 3.4 tomorrow."
        );
    }

    #[test]
    fn letter_after_lowercase_word_ends_sentence() {
        let doc = normalizer()
            .normalize("History of hepatitis B. Started tenofovir 300 mg daily.")
            .unwrap();
        let texts: Vec<_> = doc.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["History of hepatitis B.", "Started tenofovir 300 milligrams daily."]
        );

        let doc = normalizer()
            .normalize("Deficient in vitamin K. Supplement started.")
            .unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn name_initials_hold_together() {
        let doc = normalizer()
            .normalize("Reviewed by Dr. J. Smith and John F. Kennedy today. Stable.")
            .unwrap();
        let texts: Vec<_> = doc.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Reviewed by Dr. J. Smith and John F. Kennedy today.", "Stable."]
        );
    }

    #[test]
    fn split_token_keeps_slashes() {
        assert_eq!(split_token("(SOB),"), ("(", "SOB", "),"));
        assert_eq!(split_token("w/"), ("", "w/", ""));
        assert_eq!(split_token("c/o."), ("", "c/o", "."));
        assert_eq!(split_token("..."), ("", "...", ""));
    }
}
