use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type LoadResult<T> = Result<T, LoadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Markdown,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> LoadResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| LoadError::UnsupportedFormat("no extension".into()))?;

        Self::from_extension(ext).ok_or_else(|| LoadError::UnsupportedFormat(ext.into()))
    }
}

/// Report text ready for normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub format: DocumentFormat,
    pub title: Option<String>,
    pub text: String,
}

pub fn load_file(path: &Path) -> LoadResult<LoadedDocument> {
    let format = DocumentFormat::from_path(path)?;
    let data = std::fs::read(path)?;
    let mut document = load_bytes(&data, format)?;
    if document.title.is_none() {
        document.title = path.file_stem().map(|s| s.to_string_lossy().into_owned());
    }
    tracing::debug!(path = %path.display(), bytes = data.len(), ?format, "Loaded document");
    Ok(document)
}

pub fn load_bytes(data: &[u8], format: DocumentFormat) -> LoadResult<LoadedDocument> {
    let text = std::str::from_utf8(data).map_err(|e| LoadError::Encoding(e.to_string()))?;

    let document = match format {
        DocumentFormat::PlainText => LoadedDocument {
            format,
            title: None,
            text: text.to_string(),
        },
        DocumentFormat::Markdown => {
            let (title, text) = flatten_markdown(text);
            LoadedDocument {
                format,
                title,
                text,
            }
        }
    };

    Ok(document)
}

/// Turns `## Heading` lines into `Heading:` paragraphs so the normalizer
/// attaches them to the sentence that follows. The first heading is also
/// returned as the document title.
fn flatten_markdown(text: &str) -> (Option<String>, String) {
    let mut title = None;
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        if let Some(level) = heading_level(line) {
            let heading = line.trim_start().trim_start_matches('#').trim();
            if title.is_none() && !heading.is_empty() {
                title = Some(heading.to_string());
            }
            if level > 1 || title.as_deref() != Some(heading) {
                out.push_str("\n\n");
                out.push_str(heading.trim_end_matches(':'));
                out.push_str(":\n\n");
            } else {
                out.push_str("\n\n");
            }
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    (title, out)
}

fn heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }

    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level > 0 && level <= 6 && trimmed.chars().nth(level) == Some(' ') {
        u8::try_from(level).ok()
    } else {
        None
    }
}
