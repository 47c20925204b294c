use std::path::Path;

use anyhow::Result;
use console::style;
use serde::Serialize;

use medsum_core::text::capitalize_first;
use medsum_core::{
    Category, KeyFindings, PipelineError, PipelineOutput, PipelineStats, Sections,
    SummarizeError, SummaryLength,
};

use super::input::{build_pipeline, read_report, resolve_settings};
use super::{CommonArgs, OutputFormat};
use crate::config::Overrides;

#[derive(Serialize)]
struct Report<'a> {
    title: Option<&'a str>,
    clinical_summary: &'a str,
    patient_summary: &'a str,
    included_sentence_count: usize,
    findings: &'a KeyFindings,
    sections: &'a Sections,
    stats: &'a PipelineStats,
}

#[derive(Serialize)]
struct Fallback<'a> {
    title: Option<&'a str>,
    included_sentence_count: usize,
    normalized_text: &'a str,
}

pub fn run(
    path: Option<&Path>,
    length: Option<SummaryLength>,
    include: Vec<Category>,
    format: OutputFormat,
    common: &CommonArgs,
) -> Result<()> {
    let settings = resolve_settings(
        common,
        Overrides {
            length,
            include,
            ..Overrides::default()
        },
    )?;
    let pipeline = build_pipeline(&settings)?;
    let report = read_report(path)?;
    let title = report.title.clone();
    let text = report.text.clone();

    match pipeline.run_loaded(report, &settings.options) {
        Ok(output) => print_summary(&output, format),
        Err(PipelineError::Summarize(SummarizeError::NoContentSelected)) => {
            eprintln!(
                "{} No sentence matched the selected categories; showing normalized text",
                style("!").yellow()
            );
            let document = pipeline.normalize(&text)?;
            print_fallback(title.as_deref(), &document.text(), format)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(output: &PipelineOutput, format: OutputFormat) -> Result<()> {
    let stats = &output.stats;
    eprintln!(
        "{} Summarized {}: {} of {} sentences",
        style("●").green(),
        style(output.title.as_deref().unwrap_or("stdin")).bold(),
        stats.selected,
        stats.sentences
    );
    eprintln!(
        "  Expansions: {}  Redactions: {}  Time: {}ms",
        stats.expansions, stats.redactions, stats.duration_ms
    );

    match format {
        OutputFormat::Json => {
            let report = Report {
                title: output.title.as_deref(),
                clinical_summary: &output.summary.clinical_text,
                patient_summary: &output.summary.patient_text,
                included_sentence_count: output.summary.included_sentence_count,
                findings: &output.summary.findings,
                sections: output.document.sections(),
                stats,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("{}", style("Clinical summary").bold());
            println!("{}", output.summary.clinical_text);
            println!();
            println!("{}", style("Patient summary").bold());
            println!("{}", output.summary.patient_text);
            print_findings(&output.summary.findings);
            print_sections(output.document.sections());
        }
    }

    Ok(())
}

fn print_findings(findings: &KeyFindings) {
    if findings.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Key findings").bold());
    if !findings.medications.is_empty() {
        let names: Vec<_> = findings.medications.iter().map(String::as_str).collect();
        println!("  Medications: {}", names.join(", "));
    }
    if !findings.procedures.is_empty() {
        let names: Vec<_> = findings.procedures.iter().map(String::as_str).collect();
        println!("  Procedures: {}", names.join(", "));
    }
    for (vital, reading) in &findings.vital_signs {
        println!("  {}: {reading}", capitalize_first(vital.as_str()));
    }
    if let Some(diagnosis) = &findings.diagnosis {
        println!("  Diagnosis: {diagnosis}");
    }
    if let Some(treatment) = &findings.treatment {
        println!("  Treatment: {treatment}");
    }
    if let Some(follow_up) = &findings.follow_up {
        println!("  Follow-up: {follow_up}");
    }
}

fn print_sections(sections: &Sections) {
    if sections.is_empty() {
        return;
    }
    let names: Vec<String> = sections.names().map(capitalize_first).collect();
    println!();
    println!("{} {}", style("Sections:").bold(), names.join(", "));
}

fn print_fallback(title: Option<&str>, text: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let fallback = Fallback {
                title,
                included_sentence_count: 0,
                normalized_text: text,
            };
            println!("{}", serde_json::to_string_pretty(&fallback)?);
        }
        OutputFormat::Text => println!("{text}"),
    }
    Ok(())
}
