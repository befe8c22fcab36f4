// SPDX-License-Identifier: PMPL-1.0-or-later

//! Export artifacts
//!
//! Each artifact is produced on its own: a missing table or taxonomy fails
//! that artifact and the run moves on to the next one.

pub mod mods;
pub mod stats;

use crate::config::Config;
use crate::content::{self, ContentSource, MODS_TABLE, STATS_TABLE};
use crate::descriptions::{parser, ConstraintGrammar};
use crate::diagnostics::{tally, Diagnostic};
use crate::reconcile::{reconcile, ReconcileOptions};
use crate::records::{RecordTable, StatFieldTable};
use crate::taxonomy::Taxonomy;
use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub use mods::ModsDocument;
pub use stats::StatsDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Artifact {
    Stats,
    Mods,
}

impl Artifact {
    pub const ALL: [Artifact; 2] = [Artifact::Stats, Artifact::Mods];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Stats => "stats.json",
            Artifact::Mods => "mods.json",
        }
    }
}

/// Writes `value` as tab-indented JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn read_table<C>(content: &C, path: &str) -> Result<Vec<u8>>
where
    C: ContentSource + ?Sized,
{
    content
        .read_file(path)
        .with_context(|| format!("loading table {}", path))
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub records: usize,
    pub rows: usize,
    pub labels: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses descriptions, reconciles them with the taxonomy and writes
/// `stats.json` into `output_dir`.
pub fn export_stats<C>(
    content: &C,
    taxonomy: &Taxonomy,
    config: &Config,
    output_dir: &Path,
) -> Result<StatsSummary>
where
    C: ContentSource + ?Sized,
{
    let text = content::read_descriptions(content, &config.description_files)?;
    let lines = crate::descriptions::normalize_lines(&text);
    let parsed = parser::parse_lines(&lines, &ConstraintGrammar::v1(), config.base_language());
    tracing::info!(
        records = parsed.records.len(),
        skipped = parsed.diagnostics.len(),
        "parsed stat descriptions"
    );

    let stat_fields = StatFieldTable::from_json(&read_table(content, STATS_TABLE)?)
        .context("reading the Stats table")?;

    let options = ReconcileOptions::from(config);
    let reconciliation = reconcile(&parsed.records, taxonomy.entries(), &stat_fields, &options);

    let document = StatsDocument::new(&config.languages, taxonomy.labels(), reconciliation.rows);
    write_json(&output_dir.join(Artifact::Stats.file_name()), &document)?;

    let mut diagnostics = parsed.diagnostics;
    diagnostics.extend(reconciliation.diagnostics);
    Ok(StatsSummary {
        records: parsed.records.len(),
        rows: document.row_count(),
        labels: document.label_count(),
        diagnostics,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModsSummary {
    pub groups: usize,
    pub mods: usize,
}

pub fn export_mods<C>(content: &C, output_dir: &Path) -> Result<ModsSummary>
where
    C: ContentSource + ?Sized,
{
    let stat_fields = StatFieldTable::from_json(&read_table(content, STATS_TABLE)?)
        .context("reading the Stats table")?;
    let mods = RecordTable::from_json(&read_table(content, MODS_TABLE)?, mods::schema())
        .context("reading the Mods table")?;
    let document = ModsDocument::build(&mods, &stat_fields)?;
    write_json(&output_dir.join(Artifact::Mods.file_name()), &document)?;
    Ok(ModsSummary {
        groups: document.groups().len(),
        mods: document.mod_count(),
    })
}

#[derive(Debug, Clone)]
pub enum ArtifactSummary {
    Stats(StatsSummary),
    Mods(ModsSummary),
}

#[derive(Debug)]
pub struct ArtifactOutcome {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub duration: Duration,
    pub result: Result<ArtifactSummary>,
}

impl ArtifactOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl ExportReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Diagnostic counts across every artifact.
    pub fn diagnostic_counts(&self) -> Vec<(&'static str, usize)> {
        let diagnostics: Vec<Diagnostic> = self
            .outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(ArtifactSummary::Stats(summary)) => Some(summary.diagnostics.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        tally(&diagnostics)
    }
}

/// One export run over a content source.
pub struct ExportJob<'a, C: ContentSource + ?Sized> {
    pub content: &'a C,
    pub output_dir: &'a Path,
    pub taxonomy: Option<&'a Path>,
    pub config: &'a Config,
    pub artifacts: Vec<Artifact>,
}

impl<C: ContentSource + ?Sized> ExportJob<'_, C> {
    /// Runs every requested artifact, recording failures instead of stopping.
    pub fn run(&self) -> Result<ExportReport> {
        fs::create_dir_all(self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let mut report = ExportReport::default();
        for &artifact in &self.artifacts {
            let path = self.output_dir.join(artifact.file_name());
            tracing::info!(artifact = artifact.file_name(), "exporting");
            let started = Instant::now();
            let result = match artifact {
                Artifact::Stats => self.stats().map(ArtifactSummary::Stats),
                Artifact::Mods => {
                    export_mods(self.content, self.output_dir).map(ArtifactSummary::Mods)
                }
            };
            match &result {
                Ok(_) => tracing::info!(path = %path.display(), "exported"),
                Err(err) => tracing::error!(
                    artifact = artifact.file_name(),
                    "export failed: {:#}",
                    err
                ),
            }
            report.outcomes.push(ArtifactOutcome {
                artifact,
                path,
                duration: started.elapsed(),
                result,
            });
        }
        Ok(report)
    }

    fn stats(&self) -> Result<StatsSummary> {
        let path = self
            .taxonomy
            .ok_or_else(|| anyhow!("stats export needs a taxonomy file (--taxonomy)"))?;
        let taxonomy = Taxonomy::load(path)?;
        export_stats(self.content, &taxonomy, self.config, self.output_dir)
    }
}
