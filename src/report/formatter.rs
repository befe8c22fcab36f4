// SPDX-License-Identifier: PMPL-1.0-or-later

//! Console summaries

use crate::export::{ArtifactSummary, ExportReport};
use crate::report::InspectSummary;
use colored::*;

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print_export(&self, report: &ExportReport) {
        println!("\n{}", "=== STAT-MAPPER EXPORT ===".bold().cyan());
        println!();

        for outcome in &report.outcomes {
            let status = if outcome.succeeded() {
                "WRITTEN".green()
            } else {
                "FAILED".red()
            };
            println!(
                "  {}: {} ({:.2}s)",
                outcome.artifact.file_name().bold(),
                status,
                outcome.duration.as_secs_f64()
            );
            match &outcome.result {
                Ok(ArtifactSummary::Stats(summary)) => {
                    println!("    Records parsed: {}", summary.records);
                    println!("    Rows exported: {}", summary.rows);
                    println!("    Labels: {}", summary.labels);
                }
                Ok(ArtifactSummary::Mods(summary)) => {
                    println!("    Stat groups: {}", summary.groups);
                    println!("    Mods: {}", summary.mods);
                }
                Err(err) => println!("    {}", format!("{:#}", err).red()),
            }
            if outcome.succeeded() {
                println!("    Path: {}", outcome.path.display());
            }
        }
        println!();

        self.print_counts(&report.diagnostic_counts());

        if report.is_success() {
            println!("{}", "All artifacts exported".green().bold());
        } else {
            println!(
                "{}",
                format!("{} artifact(s) failed", report.failed()).red().bold()
            );
        }
    }

    pub fn print_inspect(&self, summaries: &[InspectSummary]) {
        println!("\n{}", "=== STAT DESCRIPTIONS ===".bold().cyan());
        for summary in summaries {
            println!();
            println!("{}", summary.path.bold().yellow());
            println!("  Records: {}", summary.records);
            println!("  Template lines: {}", summary.lines);
            if !summary.languages.is_empty() {
                println!("  Languages:");
                for (language, records) in &summary.languages {
                    println!("    {:<20} {}", language, records);
                }
            }
            self.print_counts(&summary.diagnostics);
        }
        println!();
    }

    fn print_counts(&self, counts: &[(&'static str, usize)]) {
        if counts.is_empty() {
            return;
        }
        println!("  {}", "Diagnostics:".bold());
        for (kind, count) in counts {
            println!("    {:<24} {}", kind, count.to_string().yellow());
        }
        println!();
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
