use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;

use medsum_core::dictionary::{AbbreviationEntry, ExpansionContext, SentencePattern};
use medsum_core::{Category, Dictionary};

pub fn run(file: Option<&Path>, abbreviations: bool, patterns: bool) -> Result<()> {
    let dictionary = match file {
        Some(path) => Arc::new(
            Dictionary::from_path(path)
                .with_context(|| format!("invalid dictionary {}", path.display()))?,
        ),
        None => Dictionary::builtin(),
    };

    let source = file.map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    eprintln!("{} Dictionary OK: {}", style("●").green(), style(&source).bold());

    let ambiguous = dictionary
        .abbreviations
        .iter()
        .filter(|e| e.is_ambiguous())
        .count();
    println!(
        "Abbreviations: {} ({ambiguous} ambiguous)",
        dictionary.abbreviations.len()
    );

    let mut per_category: BTreeMap<Category, usize> = BTreeMap::new();
    for pattern in &dictionary.patterns {
        *per_category.entry(pattern.category).or_default() += 1;
    }
    println!("Patterns: {}", dictionary.patterns.len());
    for (category, count) in &per_category {
        println!("  {category}: {count}");
    }
    println!("Lay terms: {}", dictionary.lay_terms.len());

    if abbreviations {
        println!();
        for entry in dictionary.abbreviations.iter() {
            print_entry(entry);
        }
    }

    if patterns {
        println!();
        for pattern in &dictionary.patterns {
            print_pattern(pattern);
        }
    }

    Ok(())
}

fn print_pattern(pattern: &SentencePattern) {
    println!(
        "{:<24} {:<14} {:>3}  {}",
        pattern.name,
        pattern.category.as_str(),
        pattern.weight,
        pattern.matcher.describe()
    );
}

fn print_entry(entry: &AbbreviationEntry) {
    let expansions: Vec<String> = entry
        .expansions
        .iter()
        .map(|e| match e.context {
            ExpansionContext::Any => e.phrase.clone(),
            ExpansionContext::AfterNumber => format!("{} (after a number)", e.phrase),
            ExpansionContext::BeforeNumber => format!("{} (before a number)", e.phrase),
        })
        .collect();

    println!(
        "{:<8} {}",
        entry.abbreviation.to_uppercase(),
        expansions.join(" | ")
    );
    if let Some(note) = &entry.note {
        println!("         {}", style(note).dim());
    }
}
