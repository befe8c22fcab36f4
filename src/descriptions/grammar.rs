// SPDX-License-Identifier: PMPL-1.0-or-later

//! Versioned rule table for constraint tokens
//!
//! A template line opens with one constraint token per stat. Rules are tried
//! in order and the first one that classifies a token wins. Callers can
//! append rules for token shapes a newer file revision introduces.

use crate::types::ValueClass;

#[derive(Clone, Copy)]
pub struct ConstraintRule {
    pub name: &'static str,
    pub classify: fn(&str) -> Option<ValueClass>,
}

impl std::fmt::Debug for ConstraintRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintRule")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ConstraintGrammar {
    version: u32,
    rules: Vec<ConstraintRule>,
}

impl ConstraintGrammar {
    /// `#`, `!n`, `a|b` (either side may be `#`) and plain integers.
    pub fn v1() -> Self {
        Self {
            version: 1,
            rules: vec![
                ConstraintRule {
                    name: "any",
                    classify: classify_any,
                },
                ConstraintRule {
                    name: "not_equal",
                    classify: classify_not_equal,
                },
                ConstraintRule {
                    name: "range",
                    classify: classify_range,
                },
                ConstraintRule {
                    name: "exact",
                    classify: classify_exact,
                },
            ],
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Appends a rule and bumps the version.
    pub fn with_rule(mut self, rule: ConstraintRule) -> Self {
        self.rules.push(rule);
        self.version += 1;
        self
    }

    pub fn classify(&self, token: &str) -> Option<ValueClass> {
        self.rules.iter().find_map(|rule| (rule.classify)(token))
    }
}

impl Default for ConstraintGrammar {
    fn default() -> Self {
        Self::v1()
    }
}

fn classify_any(token: &str) -> Option<ValueClass> {
    (token == "#").then_some(ValueClass::Any)
}

fn classify_not_equal(token: &str) -> Option<ValueClass> {
    let value = token.strip_prefix('!')?.parse().ok()?;
    Some(ValueClass::NotEqual(value))
}

fn classify_range(token: &str) -> Option<ValueClass> {
    let (min, max) = token.split_once('|')?;
    Some(ValueClass::Range {
        min: parse_bound(min)?,
        max: parse_bound(max)?,
    })
}

fn classify_exact(token: &str) -> Option<ValueClass> {
    token.parse().ok().map(ValueClass::Exact)
}

/// `#` is an open bound; anything else must be an integer.
fn parse_bound(raw: &str) -> Option<Option<i64>> {
    if raw == "#" {
        Some(None)
    } else {
        raw.parse().ok().map(Some)
    }
}
