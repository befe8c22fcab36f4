// SPDX-License-Identifier: PMPL-1.0-or-later

//! Block parser for stat description files
//!
//! ```text
//! description
//! 1 local_physical_damage_+%
//! 2
//! 1|# "%1%%% increased Physical Damage"
//! #|-1 "%1%%% reduced Physical Damage" negate 1
//! lang "Russian"
//! 1
//! # "..."
//! ```
//!
//! The input must already be trimmed with blank lines removed.

use crate::descriptions::grammar::ConstraintGrammar;
use crate::descriptions::handlers::HandlerTable;
use crate::descriptions::line::{parse_template_line, LineError};
use crate::diagnostics::Diagnostic;
use crate::types::{LanguageLines, StatRecord, BASE_LANGUAGE};
use std::collections::HashSet;

pub const DESCRIPTION_MARKER: &str = "description";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingBlock,
    ReadingIds,
    ReadingLanguageCount,
    ReadingTemplateLines { remaining: usize },
    PeekingNextLanguageOrEnd,
}

/// What a `lang "<Name>"` switch line names, with whitespace removed.
pub fn language_switch(line: &str) -> Option<String> {
    let name = line.strip_prefix("lang \"")?.strip_suffix('"')?;
    Some(name.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Splits an id declaration such as `2 stat_a stat_b`.
pub fn parse_id_declaration(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = line.split_whitespace();
    let declared: usize = tokens
        .next()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| format!("id declaration '{}' does not start with a count", line))?;
    let ids: Vec<String> = tokens.map(str::to_string).collect();

    if ids.len() != declared {
        return Err(format!(
            "declared {} ids but found {}",
            declared,
            ids.len()
        ));
    }
    if ids.is_empty() {
        return Err("description declares no ids".to_string());
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = ids.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(format!("id '{}' declared twice", duplicate));
    }
    Ok(ids)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutcome {
    pub records: Vec<StatRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

struct PendingRecord {
    start_line: usize,
    ids: Vec<String>,
    sections: Vec<LanguageLines>,
}

impl PendingRecord {
    fn name(&self) -> String {
        self.ids.join(" ")
    }

    fn current(&mut self) -> &mut LanguageLines {
        // A section is always opened before template lines are read.
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}

pub struct BlockParser<'g> {
    grammar: &'g ConstraintGrammar,
    handlers: HandlerTable,
    base_language: String,
    state: ParserState,
    pending: Option<PendingRecord>,
    outcome: ParseOutcome,
}

impl<'g> BlockParser<'g> {
    pub fn new(grammar: &'g ConstraintGrammar) -> Self {
        Self::with_base_language(grammar, BASE_LANGUAGE)
    }

    pub fn with_base_language(grammar: &'g ConstraintGrammar, base_language: &str) -> Self {
        Self {
            grammar,
            handlers: HandlerTable::v1(),
            base_language: base_language.to_string(),
            state: ParserState::AwaitingBlock,
            pending: None,
            outcome: ParseOutcome::default(),
        }
    }

    pub fn with_handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Feeds one line. Returns false when the line was not consumed and must
    /// be offered again in the new state.
    pub fn step(&mut self, line_no: usize, line: &str) -> bool {
        match self.state {
            ParserState::AwaitingBlock => {
                if line == DESCRIPTION_MARKER {
                    self.state = ParserState::ReadingIds;
                }
                true
            }
            ParserState::ReadingIds => match parse_id_declaration(line) {
                Ok(ids) => {
                    self.pending = Some(PendingRecord {
                        start_line: line_no,
                        ids,
                        sections: vec![LanguageLines {
                            language: self.base_language.clone(),
                            lines: Vec::new(),
                        }],
                    });
                    self.state = ParserState::ReadingLanguageCount;
                    true
                }
                Err(reason) => {
                    self.abandon(line_no, reason);
                    false
                }
            },
            ParserState::ReadingLanguageCount => match line.parse::<usize>() {
                Ok(0) => {
                    self.state = ParserState::PeekingNextLanguageOrEnd;
                    true
                }
                Ok(count) => {
                    self.state = ParserState::ReadingTemplateLines { remaining: count };
                    true
                }
                Err(_) => {
                    self.abandon(line_no, format!("expected a line count, found '{}'", line));
                    false
                }
            },
            ParserState::ReadingTemplateLines { remaining } => {
                if line == DESCRIPTION_MARKER {
                    self.abandon(
                        line_no,
                        format!("description ended {} template lines early", remaining),
                    );
                    return false;
                }
                self.read_template_line(line_no, line);
                self.state = if remaining > 1 {
                    ParserState::ReadingTemplateLines {
                        remaining: remaining - 1,
                    }
                } else {
                    ParserState::PeekingNextLanguageOrEnd
                };
                true
            }
            ParserState::PeekingNextLanguageOrEnd => match language_switch(line) {
                Some(language) => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.sections.push(LanguageLines {
                            language,
                            lines: Vec::new(),
                        });
                    }
                    self.state = ParserState::ReadingLanguageCount;
                    true
                }
                None => {
                    self.complete();
                    false
                }
            },
        }
    }

    /// Flushes the block in progress and returns everything parsed.
    pub fn finish(mut self, line_count: usize) -> ParseOutcome {
        match self.state {
            ParserState::AwaitingBlock => {}
            ParserState::PeekingNextLanguageOrEnd => self.complete(),
            ParserState::ReadingIds
            | ParserState::ReadingLanguageCount
            | ParserState::ReadingTemplateLines { .. } => {
                self.abandon(line_count, "description truncated by end of input".to_string())
            }
        }
        self.outcome
    }

    fn read_template_line(&mut self, line_no: usize, line: &str) {
        let grammar = self.grammar;
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let record = pending.name();
        match parse_template_line(line, pending.ids.len(), grammar, &self.handlers) {
            Ok(parsed) => {
                for handler in parsed.unclassified_handlers {
                    let diagnostic = Diagnostic::UnclassifiedHandler {
                        line: line_no,
                        record: record.clone(),
                        handler,
                    };
                    diagnostic.emit();
                    self.outcome.diagnostics.push(diagnostic);
                }
                let stat_line = parsed.line;
                let section = pending.current();
                let duplicate = section.lines.iter().any(|existing| {
                    existing.arity_signature == stat_line.arity_signature
                        && existing.template_text == stat_line.template_text
                });
                if duplicate {
                    let diagnostic = Diagnostic::DuplicateLine {
                        line: line_no,
                        record,
                        language: section.language.clone(),
                        signature: stat_line.arity_signature,
                    };
                    self.push_diagnostic(diagnostic);
                } else {
                    section.lines.push(stat_line);
                }
            }
            Err(LineError::Unclassified(token)) => self.push_diagnostic(
                Diagnostic::UnclassifiedConstraint {
                    line: line_no,
                    record,
                    token,
                },
            ),
            Err(LineError::Malformed(reason)) => self.push_diagnostic(Diagnostic::MalformedLine {
                line: line_no,
                record,
                reason,
            }),
        }
    }

    fn complete(&mut self) {
        self.state = ParserState::AwaitingBlock;
        let Some(pending) = self.pending.take() else {
            return;
        };
        let has_base_lines = pending
            .sections
            .first()
            .is_some_and(|section| !section.lines.is_empty());
        if !has_base_lines {
            let diagnostic = Diagnostic::MalformedRecord {
                line: pending.start_line,
                reason: format!("'{}' has no {} template lines", pending.name(), self.base_language),
            };
            self.push_diagnostic(diagnostic);
            return;
        }
        self.outcome
            .records
            .push(StatRecord::new(pending.ids, pending.sections));
    }

    fn abandon(&mut self, line_no: usize, reason: String) {
        let line = self
            .pending
            .take()
            .map(|pending| pending.start_line)
            .unwrap_or(line_no);
        self.state = ParserState::AwaitingBlock;
        self.push_diagnostic(Diagnostic::MalformedRecord { line, reason });
    }

    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.outcome.diagnostics.push(diagnostic);
    }
}

/// Runs the block parser over every line. Line numbers in diagnostics are
/// 1-based positions in `lines`.
pub fn parse_lines<S: AsRef<str>>(
    lines: &[S],
    grammar: &ConstraintGrammar,
    base_language: &str,
) -> ParseOutcome {
    let mut parser = BlockParser::with_base_language(grammar, base_language);
    let mut index = 0;
    while index < lines.len() {
        if parser.step(index + 1, lines[index].as_ref()) {
            index += 1;
        }
    }
    parser.finish(lines.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParseOutcome {
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        parse_lines(&lines, &ConstraintGrammar::v1(), BASE_LANGUAGE)
    }

    #[test]
    fn test_state_transitions() {
        let grammar = ConstraintGrammar::v1();
        let mut parser = BlockParser::new(&grammar);
        assert_eq!(parser.state(), ParserState::AwaitingBlock);
        assert!(parser.step(1, "description"));
        assert_eq!(parser.state(), ParserState::ReadingIds);
        assert!(parser.step(2, "1 base_maximum_life"));
        assert_eq!(parser.state(), ParserState::ReadingLanguageCount);
        assert!(parser.step(3, "2"));
        assert_eq!(
            parser.state(),
            ParserState::ReadingTemplateLines { remaining: 2 }
        );
        assert!(parser.step(4, r#"# "%1$+d to maximum Life""#));
        assert!(parser.step(5, r#"#|-1 "%1% to maximum Life""#));
        assert_eq!(parser.state(), ParserState::PeekingNextLanguageOrEnd);
        assert!(parser.step(6, r#"lang "Traditional Chinese""#));
        assert_eq!(parser.state(), ParserState::ReadingLanguageCount);
        assert!(parser.step(7, "1"));
        assert!(parser.step(8, r#"# "%1$+d 最大生命""#));
        // The peek does not consume the next marker.
        assert!(!parser.step(9, "description"));
        assert_eq!(parser.state(), ParserState::AwaitingBlock);

        let outcome = parser.finish(9);
        assert_eq!(outcome.records.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.languages()[1].language, "TraditionalChinese");
        assert_eq!(record.lines_for("TraditionalChinese").len(), 1);
    }

    #[test]
    fn test_language_switch_pattern() {
        assert_eq!(language_switch(r#"lang "Russian""#), Some("Russian".to_string()));
        assert_eq!(
            language_switch(r#"lang "Simplified Chinese""#),
            Some("SimplifiedChinese".to_string())
        );
        assert_eq!(language_switch("language Russian"), None);
    }

    #[test]
    fn test_id_count_mismatch_skips_record_only() {
        let outcome = parse(
            r#"
description
2 only_one_id
1
# "%1% Foo"
description
1 second_stat
1
# "%1% Bar"
"#,
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].full_identifier(), "second_stat");
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::MalformedRecord { line: 2, .. }
        ));
    }

    #[test]
    fn test_unclassified_token_keeps_record() {
        let outcome = parse(
            r#"
description
1 chance_to_freeze_%
2
1..5 "%1%%% chance to Freeze"
# "%1%%% chance to Freeze"
"#,
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].base_lines().len(), 1);
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::UnclassifiedConstraint { token, .. } if token == "1..5"
        ));
    }

    #[test]
    fn test_lines_outside_blocks_are_ignored() {
        let outcome = parse(
            r#"
no_description level
include "Metadata/StatDescriptions/stat_descriptions.txt"
description
1 base_cannot_be_frozen
1
# "Cannot be Frozen"
"#,
        );
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_truncated_block_is_malformed() {
        let outcome = parse(
            r#"
description
1 truncated_stat
3
# "%1% Foo"
"#,
        );
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.diagnostics.len(), 1);
    }

    #[test]
    fn test_duplicate_line_is_dropped() {
        let outcome = parse(
            r#"
description
1 life_regeneration_rate_per_minute_%
2
# "Regenerate %1%%% of Life per second"
# "Regenerate %1%%% of Life per second"
"#,
        );
        assert_eq!(outcome.records[0].base_lines().len(), 1);
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::DuplicateLine { line: 5, .. }
        ));
    }

    #[test]
    fn test_missing_count_line_recovers_at_next_marker() {
        let outcome = parse(
            r#"
description
1 broken_stat
description
1 fine_stat
1
# "%1% Fine"
"#,
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].full_identifier(), "fine_stat");
    }

    #[test]
    fn test_overstated_line_count_stops_at_next_marker() {
        let outcome = parse(
            r#"
description
1 a_stat
3
# "%1% A"
description
1 b_stat
1
# "%1% B"
"#,
        );
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].full_identifier(), "b_stat");
        assert_eq!(outcome.records[0].base_lines()[0].template_text, "# B");
        assert!(matches!(
            &outcome.diagnostics[..],
            [Diagnostic::MalformedRecord { line: 2, .. }]
        ));
    }

    #[test]
    fn test_combined_negating_handler_sets_negated() {
        let outcome = parse(
            r#"
description
1 mana_cost_+%
2
1|# "%1%%% increased Mana Cost" divide_by_one_hundred 1
#|-1 "%1%%% reduced Mana Cost" divide_by_one_hundred_and_negate 1
"#,
        );
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.records[0].negated());
    }

    #[test]
    fn test_unclassified_handler_is_reported_and_line_kept() {
        let outcome = parse(
            r#"
description
1 base_skill_area_of_effect_+%
1
# "%1%%% increased Area of Effect" plus_two_hundred 1
"#,
        );
        assert_eq!(outcome.records[0].base_lines().len(), 1);
        assert!(matches!(
            &outcome.diagnostics[..],
            [Diagnostic::UnclassifiedHandler { line: 4, handler, .. }] if handler == "plus_two_hundred"
        ));
    }
}
