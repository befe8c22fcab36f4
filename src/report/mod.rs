// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run summaries for the console and for `inspect --json`

pub mod formatter;

use crate::content::decode_text;
use crate::descriptions::{parser, ConstraintGrammar, ParseOutcome};
use crate::diagnostics::tally;
use crate::export::ExportReport;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub use formatter::ReportFormatter;

/// Record, language and diagnostic counts of one description file.
#[derive(Debug, Clone, Serialize)]
pub struct InspectSummary {
    pub path: String,
    pub records: usize,
    pub lines: usize,
    /// Records carrying each language, in first-seen order.
    pub languages: Vec<(String, usize)>,
    pub diagnostics: Vec<(&'static str, usize)>,
}

impl InspectSummary {
    pub fn from_outcome(path: &str, outcome: &ParseOutcome) -> Self {
        let mut languages: Vec<(String, usize)> = Vec::new();
        let mut lines = 0;
        for record in &outcome.records {
            for section in record.languages() {
                lines += section.lines.len();
                match languages.iter_mut().find(|(name, _)| *name == section.language) {
                    Some((_, count)) => *count += 1,
                    None => languages.push((section.language.clone(), 1)),
                }
            }
        }
        Self {
            path: path.to_string(),
            records: outcome.records.len(),
            lines,
            languages,
            diagnostics: tally(&outcome.diagnostics),
        }
    }
}

/// Parses one description file from disk.
pub fn inspect_file(path: &Path, base_language: &str) -> Result<InspectSummary> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text =
        decode_text(&bytes).ok_or_else(|| anyhow!("{} is not decodable text", path.display()))?;
    let lines = crate::descriptions::normalize_lines(&text);
    let outcome = parser::parse_lines(&lines, &ConstraintGrammar::v1(), base_language);
    Ok(InspectSummary::from_outcome(
        &path.display().to_string(),
        &outcome,
    ))
}

pub fn print_export(report: &ExportReport) {
    ReportFormatter::new().print_export(report);
}

pub fn print_inspect(summaries: &[InspectSummary]) {
    ReportFormatter::new().print_inspect(summaries);
}
