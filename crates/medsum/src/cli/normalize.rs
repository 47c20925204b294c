use std::path::Path;

use anyhow::Result;
use console::style;

use super::input::{build_pipeline, read_report, resolve_settings};
use super::CommonArgs;
use crate::config::Overrides;

pub fn run(path: Option<&Path>, annotate: bool, common: &CommonArgs) -> Result<()> {
    let settings = resolve_settings(common, Overrides::default())?;
    let pipeline = build_pipeline(&settings)?;
    let report = read_report(path)?;
    let document = pipeline.normalize(&report.text)?;

    eprintln!(
        "{} {} sentences, {} expansions, {} redactions",
        style("●").green(),
        document.len(),
        document.expansion_count(),
        document.redaction_count()
    );

    for sentence in document.iter() {
        if annotate {
            println!("{}", sentence.annotated());
        } else {
            println!("{}", sentence.text);
        }
    }

    Ok(())
}
