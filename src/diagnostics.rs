// SPDX-License-Identifier: PMPL-1.0-or-later

//! Recoverable findings collected while parsing and reconciling
//!
//! None of these stop a run. Each one is logged when it is emitted and kept
//! so callers can count or export them afterwards.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `description` block that could not be turned into a record.
    MalformedRecord { line: usize, reason: String },
    /// A template line dropped from an otherwise valid record.
    MalformedLine {
        line: usize,
        record: String,
        reason: String,
    },
    /// A constraint token no grammar rule recognises; the line is dropped.
    UnclassifiedConstraint {
        line: usize,
        record: String,
        token: String,
    },
    /// A handler keyword no rule recognises; the line is kept without it.
    UnclassifiedHandler {
        line: usize,
        record: String,
        handler: String,
    },
    DuplicateLine {
        line: usize,
        record: String,
        language: String,
        signature: String,
    },
    UnresolvedStat {
        label: String,
        trade_id: String,
        text: String,
    },
    /// Several records generate the same text; `chosen` came first.
    AmbiguousMatch {
        text: String,
        chosen: String,
        others: Vec<String>,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::MalformedRecord { .. } => "malformed_record",
            Diagnostic::MalformedLine { .. } => "malformed_line",
            Diagnostic::UnclassifiedConstraint { .. } => "unclassified_constraint",
            Diagnostic::UnclassifiedHandler { .. } => "unclassified_handler",
            Diagnostic::DuplicateLine { .. } => "duplicate_line",
            Diagnostic::UnresolvedStat { .. } => "unresolved_stat",
            Diagnostic::AmbiguousMatch { .. } => "ambiguous_match",
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Diagnostic::DuplicateLine { .. } => Level::Info,
            _ => Level::Warn,
        }
    }

    /// Writes the diagnostic to the log at its level.
    pub fn emit(&self) {
        match self.level() {
            Level::Info => tracing::info!(kind = self.kind(), "{}", self),
            Level::Warn => tracing::warn!(kind = self.kind(), "{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedRecord { line, reason } => {
                write!(f, "skipping description at line {}: {}", line, reason)
            }
            Diagnostic::MalformedLine {
                line,
                record,
                reason,
            } => write!(
                f,
                "skipping template line {} of '{}': {}",
                line, record, reason
            ),
            Diagnostic::UnclassifiedConstraint {
                line,
                record,
                token,
            } => write!(
                f,
                "unclassified constraint token '{}' at line {} of '{}'",
                token, line, record
            ),
            Diagnostic::UnclassifiedHandler {
                line,
                record,
                handler,
            } => write!(
                f,
                "unclassified handler '{}' at line {} of '{}'",
                handler, line, record
            ),
            Diagnostic::DuplicateLine {
                line,
                record,
                language,
                signature,
            } => write!(
                f,
                "duplicate {} line '{}' at line {} of '{}'",
                language, signature, line, record
            ),
            Diagnostic::UnresolvedStat {
                label,
                trade_id,
                text,
            } => write!(
                f,
                "missing stat description for label '{}' trade id '{}', text: '{}'",
                label, trade_id, text
            ),
            Diagnostic::AmbiguousMatch {
                text,
                chosen,
                others,
            } => write!(
                f,
                "'{}' matches {} descriptions, using '{}' over {:?}",
                text,
                others.len() + 1,
                chosen,
                others
            ),
        }
    }
}

/// Per-kind counts, in first-seen order.
pub fn tally(diagnostics: &[Diagnostic]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for diagnostic in diagnostics {
        let kind = diagnostic.kind();
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((kind, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_keeps_first_seen_order() {
        let diagnostics = vec![
            Diagnostic::UnresolvedStat {
                label: "explicit".into(),
                trade_id: "stat_1".into(),
                text: "Foo".into(),
            },
            Diagnostic::MalformedRecord {
                line: 3,
                reason: "bad".into(),
            },
            Diagnostic::UnresolvedStat {
                label: "explicit".into(),
                trade_id: "stat_2".into(),
                text: "Bar".into(),
            },
        ];
        assert_eq!(
            tally(&diagnostics),
            vec![("unresolved_stat", 2), ("malformed_record", 1)]
        );
    }

    #[test]
    fn test_duplicate_lines_are_informational() {
        let duplicate = Diagnostic::DuplicateLine {
            line: 10,
            record: "life".into(),
            language: "English".into(),
            signature: "#".into(),
        };
        assert_eq!(duplicate.level(), Level::Info);
        assert_eq!(duplicate.level().tag(), "INFO");
    }
}
