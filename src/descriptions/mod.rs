// SPDX-License-Identifier: PMPL-1.0-or-later

//! Stat description files
//!
//! Turns the game's block-structured, multi-language description text into
//! [`StatRecord`]s.

pub mod grammar;
pub mod handlers;
pub mod line;
pub mod parser;

use crate::types::{StatRecord, BASE_LANGUAGE};

pub use grammar::{ConstraintGrammar, ConstraintRule};
pub use handlers::{Handler, HandlerArg, HandlerRule, HandlerTable};
pub use line::{parse_template_line, LineError, ParsedLine};
pub use parser::{BlockParser, ParseOutcome, ParserState};

/// Trims every line and drops the empty ones.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses pre-normalized lines with the default grammar. Skipped blocks and
/// lines are logged.
pub fn parse<S: AsRef<str>>(lines: &[S]) -> Vec<StatRecord> {
    parse_with_diagnostics(lines).records
}

pub fn parse_with_diagnostics<S: AsRef<str>>(lines: &[S]) -> ParseOutcome {
    parser::parse_lines(lines, &ConstraintGrammar::v1(), BASE_LANGUAGE)
}

/// Parses raw description text, normalizing it first.
pub fn parse_text(text: &str, grammar: &ConstraintGrammar, base_language: &str) -> ParseOutcome {
    let lines = normalize_lines(text);
    parser::parse_lines(&lines, grammar, base_language)
}
