// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core types shared by the parser, matcher and reconciler

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language every description file starts in.
pub const BASE_LANGUAGE: &str = "English";

/// Internal values this close to an integer are compared as that integer.
const INTEGER_TOLERANCE: f64 = 1e-6;

/// Value restriction a template line places on one stat.
///
/// Template lines pick between phrasings ("1 additional Projectile" versus
/// "# additional Projectiles", "increased" versus "reduced") by declaring a
/// value class per stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueClass {
    Any,
    Exact(i64),
    NotEqual(i64),
    Range { min: Option<i64>, max: Option<i64> },
}

impl ValueClass {
    /// Whether an internal (untransformed) value belongs to this class.
    pub fn admits(&self, value: f64) -> bool {
        let value = snap_to_integer(value);
        match *self {
            ValueClass::Any => true,
            ValueClass::Exact(n) => value == n as f64,
            ValueClass::NotEqual(n) => value != n as f64,
            ValueClass::Range { min, max } => {
                min.map_or(true, |m| value >= m as f64) && max.map_or(true, |m| value <= m as f64)
            }
        }
    }
}

/// Removes the rounding error scaling transforms leave behind
/// (`0.07 * 100.0` is `7.000000000000001`).
fn snap_to_integer(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < INTEGER_TOLERANCE {
        rounded
    } else {
        value
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound(value: Option<i64>) -> String {
            value.map_or_else(|| "#".to_string(), |v| v.to_string())
        }
        match *self {
            ValueClass::Any => write!(f, "#"),
            ValueClass::Exact(n) => write!(f, "{}", n),
            ValueClass::NotEqual(n) => write!(f, "!{}", n),
            ValueClass::Range { min, max } => write!(f, "{}|{}", bound(min), bound(max)),
        }
    }
}

/// Display transform a handler keyword applies to one stat's value.
///
/// Handler keywords are classified by
/// [`HandlerTable`](crate::descriptions::HandlerTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueTransform {
    Negate,
    NegateAndDouble,
    Double,
    TimesTwenty,
    DivideByTwo,
    DivideByTen,
    DivideByOneHundred,
    DivideByOneThousand,
    MillisecondsToSeconds,
    DecisecondsToSeconds,
    PerMinuteToPerSecond,
}

impl ValueTransform {
    /// Inverts the transform: maps a displayed number back to the stat value.
    pub fn to_internal(self, displayed: f64) -> f64 {
        match self {
            ValueTransform::Negate => -displayed,
            ValueTransform::NegateAndDouble => -displayed / 2.0,
            ValueTransform::Double => displayed / 2.0,
            ValueTransform::TimesTwenty => displayed / 20.0,
            ValueTransform::DivideByTwo => displayed * 2.0,
            ValueTransform::DivideByTen => displayed * 10.0,
            ValueTransform::DivideByOneHundred => displayed * 100.0,
            ValueTransform::DivideByOneThousand => displayed * 1000.0,
            ValueTransform::MillisecondsToSeconds => displayed * 1000.0,
            ValueTransform::DecisecondsToSeconds => displayed * 10.0,
            ValueTransform::PerMinuteToPerSecond => displayed * 60.0,
        }
    }

    pub fn inverts_sign(self) -> bool {
        matches!(self, ValueTransform::Negate | ValueTransform::NegateAndDouble)
    }
}

/// One piece of a tokenized template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternToken {
    Literal(String),
    /// Numeric placeholder bound to the stat at `stat` (0-based).
    Slot { stat: usize, signed: bool },
}

/// One localized phrasing of a stat description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub arity_signature: String,
    pub template_text: String,
    /// One entry per stat of the owning record.
    pub value_classes: Vec<ValueClass>,
    /// Handler chain per stat of the owning record, in declaration order.
    pub transforms: Vec<Vec<ValueTransform>>,
    pub tokens: Vec<PatternToken>,
}

impl StatLine {
    pub fn slot_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|token| matches!(token, PatternToken::Slot { .. }))
            .count()
    }

    pub fn inverts_sign(&self) -> bool {
        self.transforms
            .iter()
            .flatten()
            .any(|transform| transform.inverts_sign())
    }

    /// Maps a displayed number for `stat` back through its handler chain.
    pub fn internal_value(&self, stat: usize, displayed: f64) -> f64 {
        self.transforms
            .get(stat)
            .map(|chain| {
                chain
                    .iter()
                    .rev()
                    .fold(displayed, |value, transform| transform.to_internal(value))
            })
            .unwrap_or(displayed)
    }
}

/// Template lines of one language section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageLines {
    pub language: String,
    pub lines: Vec<StatLine>,
}

/// One parsed `description` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    internal_ids: Vec<String>,
    full_identifier: String,
    negated: bool,
    lines_by_language: Vec<LanguageLines>,
}

impl StatRecord {
    /// Builds a record; the first language section is the base language.
    pub fn new(internal_ids: Vec<String>, lines_by_language: Vec<LanguageLines>) -> Self {
        let full_identifier = internal_ids.join(" ");
        let negated = lines_by_language
            .iter()
            .flat_map(|section| section.lines.iter())
            .any(StatLine::inverts_sign);
        Self {
            internal_ids,
            full_identifier,
            negated,
            lines_by_language,
        }
    }

    pub fn internal_ids(&self) -> &[String] {
        &self.internal_ids
    }

    pub fn full_identifier(&self) -> &str {
        &self.full_identifier
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn languages(&self) -> &[LanguageLines] {
        &self.lines_by_language
    }

    pub fn base_lines(&self) -> &[StatLine] {
        self.lines_by_language
            .first()
            .map(|section| section.lines.as_slice())
            .unwrap_or(&[])
    }

    pub fn lines_for(&self, language: &str) -> &[StatLine] {
        self.lines_by_language
            .iter()
            .find(|section| section.language == language)
            .map(|section| section.lines.as_slice())
            .unwrap_or(&[])
    }
}

/// Entry of the external stat taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub label: String,
    pub trade_id: String,
    pub display_text: String,
}

/// Templates of one language keyed by arity signature, in line order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTemplates {
    pub language: String,
    pub templates: Vec<(String, String)>,
}

/// A taxonomy entry mapped back to its stat description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRow {
    pub label: String,
    pub trade_id: String,
    pub full_identifier: String,
    pub is_local: bool,
    pub negated: bool,
    pub text_by_language: Vec<LanguageTemplates>,
}

impl ResolvedRow {
    pub fn text(&self, language: &str, signature: &str) -> Option<&str> {
        self.text_by_language
            .iter()
            .find(|entry| entry.language == language)?
            .templates
            .iter()
            .find(|(sig, _)| sig == signature)
            .map(|(_, text)| text.as_str())
    }
}
