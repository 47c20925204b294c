//! Small string helpers shared by the normalizer, the lay-term pass and the
//! findings extractor.

const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Drops control and zero-width characters. Whitespace controls (newline, tab,
/// carriage return) are kept so paragraph breaks survive.
pub fn strip_non_printable(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_whitespace() || !(c.is_control() || ZERO_WIDTH.contains(c)))
        .collect()
}

/// Collapses repeated whitespace, trims edges, and turns newlines into single
/// spaces.
pub fn collapse_whitespace(s: &str) -> String {
    let mut normalized = String::with_capacity(s.len());
    for segment in s.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

fn is_clause_punctuation(c: char) -> bool {
    matches!(c, ',' | '.' | ';' | ':' | '!' | '?')
}

/// Removes whitespace in front of clause punctuation (`word ,` -> `word,`) and
/// squeezes runs of the same punctuation mark (`!!!` -> `!`, `...` -> `.`).
///
/// Expects input that already went through [`collapse_whitespace`].
pub fn tidy_punctuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ' ' {
            if let Some(&next) = chars.peek() {
                if is_clause_punctuation(next) && !out.is_empty() {
                    continue;
                }
            }
        }
        if is_clause_punctuation(c) && out.ends_with(c) {
            continue;
        }
        out.push(c);
    }

    out
}

/// Letter casing of a source token, used to shape the text that replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseShape {
    /// Two or more letters, all uppercase (`SOB`, `F/U`).
    Upper,
    /// First letter uppercase, not all caps (`Pt`, `K`).
    Capitalized,
    Lower,
}

impl CaseShape {
    pub fn of(token: &str) -> Self {
        let mut letters = token.chars().filter(|c| c.is_alphabetic());
        let Some(first) = letters.next() else {
            return Self::Lower;
        };
        let rest: Vec<char> = letters.collect();

        if first.is_uppercase() && !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
            Self::Upper
        } else if first.is_uppercase() {
            Self::Capitalized
        } else {
            Self::Lower
        }
    }

    /// Applies this shape to a replacement phrase.
    pub fn apply(self, phrase: &str) -> String {
        match self {
            Self::Upper => title_case(phrase),
            Self::Capitalized => capitalize_first(phrase),
            Self::Lower => phrase.to_string(),
        }
    }
}

/// Uppercases the first letter of every space-separated word.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// True when the token starts with a digit once leading brackets are ignored
/// (`10`, `4.2`, `120/80`, `(5`).
pub fn looks_numeric(token: &str) -> bool {
    token
        .trim_start_matches(['(', '[', '~', '<', '>', '='])
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}
