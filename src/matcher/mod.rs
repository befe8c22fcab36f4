// SPDX-License-Identifier: PMPL-1.0-or-later

//! Stat template matcher
//!
//! Finds the description record whose base-language template generates a
//! concrete display string such as `"40% increased Physical Damage"`.

pub mod pattern;

use crate::diagnostics::Diagnostic;
use crate::types::StatRecord;
use pattern::CompiledPattern;

/// Suffixes the trade site appends to disambiguate otherwise equal texts.
pub const DEFAULT_TRADE_SUFFIXES: &[&str] =
    &[" (Local)", " (Shields)", " (Maps)", " (Legacy)", " (Staves)"];

/// Strips known suffixes, longest first, until none applies.
pub fn normalize_trade_text<'t, S: AsRef<str>>(text: &'t str, suffixes: &[S]) -> &'t str {
    let mut current = text;
    loop {
        let longest = suffixes
            .iter()
            .map(|suffix| suffix.as_ref())
            .filter(|suffix| !suffix.is_empty() && current.ends_with(*suffix))
            .max_by_key(|suffix| suffix.len());
        match longest {
            Some(suffix) => current = &current[..current.len() - suffix.len()],
            None => return current,
        }
    }
}

pub fn has_matching_identifier(record: &StatRecord, internal_id: &str) -> bool {
    record.internal_ids().iter().any(|id| id == internal_id)
}

#[derive(Debug, Clone, Copy)]
pub struct MatchedStat<'r> {
    pub record: &'r StatRecord,
    /// Position of `record` in discovery order.
    pub record_index: usize,
    pub arity_signature: &'r str,
}

/// Every record that generates a text; the first is the owner.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'r> {
    pub owner: Option<MatchedStat<'r>>,
    pub others: Vec<&'r StatRecord>,
}

impl<'r> Resolution<'r> {
    pub fn is_ambiguous(&self) -> bool {
        !self.others.is_empty()
    }

    pub fn ambiguity(&self, text: &str) -> Option<Diagnostic> {
        let owner = self.owner.as_ref()?;
        if !self.is_ambiguous() {
            return None;
        }
        Some(Diagnostic::AmbiguousMatch {
            text: text.to_string(),
            chosen: owner.record.full_identifier().to_string(),
            others: self
                .others
                .iter()
                .map(|record| record.full_identifier().to_string())
                .collect(),
        })
    }
}

struct CompiledLine {
    record: usize,
    line: usize,
    pattern: CompiledPattern,
}

/// Base-language patterns of a record set, compiled once.
pub struct StatMatcher<'r> {
    records: &'r [StatRecord],
    lines: Vec<CompiledLine>,
}

impl<'r> StatMatcher<'r> {
    pub fn new(records: &'r [StatRecord]) -> Self {
        let mut lines = Vec::new();
        for (record_index, record) in records.iter().enumerate() {
            for (line_index, line) in record.base_lines().iter().enumerate() {
                match CompiledPattern::compile(line) {
                    Ok(pattern) => lines.push(CompiledLine {
                        record: record_index,
                        line: line_index,
                        pattern,
                    }),
                    Err(err) => tracing::warn!(
                        record = record.full_identifier(),
                        "cannot compile template '{}': {}",
                        line.template_text,
                        err
                    ),
                }
            }
        }
        tracing::debug!(
            records = records.len(),
            patterns = lines.len(),
            "compiled stat templates"
        );
        Self { records, lines }
    }

    /// Collects the owner and every other record generating `text`.
    /// `text` must already be suffix-normalized.
    pub fn resolve(&self, text: &str) -> Resolution<'r> {
        let mut resolution = Resolution::default();
        let records = self.records;

        for compiled in &self.lines {
            let record = &records[compiled.record];
            let line = &record.base_lines()[compiled.line];
            if !compiled.pattern.matches(line, text) {
                continue;
            }
            match &resolution.owner {
                None => {
                    resolution.owner = Some(MatchedStat {
                        record,
                        record_index: compiled.record,
                        arity_signature: &line.arity_signature,
                    });
                }
                Some(owner) if owner.record_index == compiled.record => {}
                Some(_) => {
                    if !resolution
                        .others
                        .iter()
                        .any(|other| std::ptr::eq(*other, record))
                    {
                        resolution.others.push(record);
                    }
                }
            }
        }

        resolution
    }

    /// First record (in discovery order) generating `text`. Ambiguity is
    /// logged, never fatal.
    pub fn find_owner(&self, text: &str) -> Option<MatchedStat<'r>> {
        let resolution = self.resolve(text);
        if let Some(diagnostic) = resolution.ambiguity(text) {
            diagnostic.emit();
        }
        resolution.owner
    }
}

/// One-shot form of [`StatMatcher::find_owner`].
pub fn find_owner<'r>(records: &'r [StatRecord], text: &str) -> Option<MatchedStat<'r>> {
    StatMatcher::new(records).find_owner(text)
}
