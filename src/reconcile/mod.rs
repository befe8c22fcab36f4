// SPDX-License-Identifier: PMPL-1.0-or-later

//! Taxonomy reconciler
//!
//! Walks the trade site's stat taxonomy and maps each entry back to the
//! description record that generates its text, carrying every localized
//! template of that record along.

use crate::config::{Config, DEFAULT_SUPPRESSED_LABELS};
use crate::diagnostics::Diagnostic;
use crate::matcher::{normalize_trade_text, StatMatcher, DEFAULT_TRADE_SUFFIXES};
use crate::types::{LanguageTemplates, ResolvedRow, StatRecord, TaxonomyEntry};
use rayon::prelude::*;

/// Decides whether a record describes a local (item-bound) stat.
pub trait StatLocality {
    fn is_local(&self, record: &StatRecord) -> bool;
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub suffixes: Vec<String>,
    /// Labels whose unresolved entries are expected and not reported.
    pub suppressed_labels: Vec<String>,
    pub parallel: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_TRADE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            suppressed_labels: DEFAULT_SUPPRESSED_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parallel: false,
        }
    }
}

impl From<&Config> for ReconcileOptions {
    fn from(config: &Config) -> Self {
        Self {
            suffixes: config.trade_suffixes.clone(),
            suppressed_labels: config.suppressed_labels.clone(),
            parallel: config.parallel,
        }
    }
}

impl ReconcileOptions {
    fn is_suppressed(&self, label: &str) -> bool {
        self.suppressed_labels.iter().any(|s| s == label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// One row per resolved entry, in taxonomy order.
    pub rows: Vec<ResolvedRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Reconciliation {
    pub fn unresolved(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvedStat { .. }))
            .count()
    }
}

/// Every language's lines keyed by signature; a repeated signature keeps
/// its first line.
fn language_templates(record: &StatRecord) -> Vec<LanguageTemplates> {
    record
        .languages()
        .iter()
        .map(|section| {
            let mut templates: Vec<(String, String)> = Vec::with_capacity(section.lines.len());
            for line in &section.lines {
                if templates.iter().any(|(sig, _)| *sig == line.arity_signature) {
                    continue;
                }
                templates.push((line.arity_signature.clone(), line.template_text.clone()));
            }
            LanguageTemplates {
                language: section.language.clone(),
                templates,
            }
        })
        .collect()
}

fn reconcile_entry<L>(
    matcher: &StatMatcher<'_>,
    entry: &TaxonomyEntry,
    locality: &L,
    options: &ReconcileOptions,
) -> (Option<ResolvedRow>, Vec<Diagnostic>)
where
    L: StatLocality + ?Sized,
{
    let text = normalize_trade_text(&entry.display_text, &options.suffixes);
    let resolution = matcher.resolve(text);
    let mut diagnostics = Vec::new();
    if let Some(ambiguity) = resolution.ambiguity(text) {
        diagnostics.push(ambiguity);
    }

    let Some(owner) = resolution.owner else {
        if !options.is_suppressed(&entry.label) {
            diagnostics.push(Diagnostic::UnresolvedStat {
                label: entry.label.clone(),
                trade_id: entry.trade_id.clone(),
                text: entry.display_text.clone(),
            });
        }
        return (None, diagnostics);
    };

    let record = owner.record;
    let row = ResolvedRow {
        label: entry.label.clone(),
        trade_id: entry.trade_id.clone(),
        full_identifier: record.full_identifier().to_string(),
        is_local: locality.is_local(record),
        negated: record.negated(),
        text_by_language: language_templates(record),
    };
    (Some(row), diagnostics)
}

/// Resolves every taxonomy entry against the parsed records.
///
/// Rows and diagnostics come out in taxonomy order whether or not
/// `options.parallel` is set. Diagnostics are emitted to the log as well.
pub fn reconcile<L>(
    records: &[StatRecord],
    entries: &[TaxonomyEntry],
    locality: &L,
    options: &ReconcileOptions,
) -> Reconciliation
where
    L: StatLocality + Sync + ?Sized,
{
    let matcher = StatMatcher::new(records);

    let outcomes: Vec<(Option<ResolvedRow>, Vec<Diagnostic>)> = if options.parallel {
        entries
            .par_iter()
            .map(|entry| reconcile_entry(&matcher, entry, locality, options))
            .collect()
    } else {
        entries
            .iter()
            .map(|entry| reconcile_entry(&matcher, entry, locality, options))
            .collect()
    };

    let mut reconciliation = Reconciliation::default();
    for (row, diagnostics) in outcomes {
        for diagnostic in diagnostics {
            diagnostic.emit();
            reconciliation.diagnostics.push(diagnostic);
        }
        reconciliation.rows.extend(row);
    }

    tracing::info!(
        entries = entries.len(),
        resolved = reconciliation.rows.len(),
        unresolved = reconciliation.unresolved(),
        "reconciled taxonomy"
    );
    reconciliation
}
