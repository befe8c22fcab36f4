// SPDX-License-Identifier: PMPL-1.0-or-later

//! Versioned rule table for handler keywords
//!
//! Handlers follow the quoted text of a template line (`negate 1`,
//! `milliseconds_to_seconds_2dp 1`, `reminderstring ReminderTextFoo`).
//! Rules are tried in order and the first one that classifies a keyword
//! wins. A keyword no rule classifies is reported by the line parser.

use crate::types::ValueTransform;

/// What follows a handler keyword on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerArg {
    None,
    /// 1-based stat index the handler applies to.
    Stat,
    /// One free-form word, such as a reminder text id.
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    /// Applied to the stat's value in order to produce the displayed number.
    pub transforms: Vec<ValueTransform>,
    pub arg: HandlerArg,
}

impl Handler {
    fn display_only(arg: HandlerArg) -> Self {
        Self {
            transforms: Vec::new(),
            arg,
        }
    }

    fn scaling(transforms: &[ValueTransform]) -> Self {
        Self {
            transforms: transforms.to_vec(),
            arg: HandlerArg::Stat,
        }
    }
}

#[derive(Clone, Copy)]
pub struct HandlerRule {
    pub name: &'static str,
    pub classify: fn(&str) -> Option<Handler>,
}

impl std::fmt::Debug for HandlerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRule")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HandlerTable {
    version: u32,
    rules: Vec<HandlerRule>,
}

impl HandlerTable {
    /// Reminder and line flags, value scaling with its precision variants,
    /// display-only stat handlers, then any remaining `*negate*` keyword as
    /// a sign inversion.
    pub fn v1() -> Self {
        Self {
            version: 1,
            rules: vec![
                HandlerRule {
                    name: "reminder",
                    classify: classify_reminder,
                },
                HandlerRule {
                    name: "line_flag",
                    classify: classify_line_flag,
                },
                HandlerRule {
                    name: "scaling",
                    classify: classify_scaling,
                },
                HandlerRule {
                    name: "display",
                    classify: classify_display,
                },
                HandlerRule {
                    name: "negating",
                    classify: classify_negating,
                },
            ],
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Appends a rule and bumps the version.
    pub fn with_rule(mut self, rule: HandlerRule) -> Self {
        self.rules.push(rule);
        self.version += 1;
        self
    }

    pub fn classify(&self, keyword: &str) -> Option<Handler> {
        self.rules.iter().find_map(|rule| (rule.classify)(keyword))
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::v1()
    }
}

/// Drops display precision suffixes: `_if_required`, then `_<n>dp`.
pub fn base_handler_name(keyword: &str) -> &str {
    let name = keyword.strip_suffix("_if_required").unwrap_or(keyword);
    match name.rsplit_once('_') {
        Some((base, precision))
            if precision.len() > 2
                && precision.ends_with("dp")
                && precision[..precision.len() - 2]
                    .chars()
                    .all(|c| c.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

fn classify_reminder(keyword: &str) -> Option<Handler> {
    (keyword == "reminderstring").then(|| Handler::display_only(HandlerArg::Word))
}

fn classify_line_flag(keyword: &str) -> Option<Handler> {
    (keyword == "canonical_line").then(|| Handler::display_only(HandlerArg::None))
}

fn classify_scaling(keyword: &str) -> Option<Handler> {
    use ValueTransform::*;

    let transforms: &[ValueTransform] = match base_handler_name(keyword) {
        "negate" => &[Negate],
        "negate_and_double" => &[NegateAndDouble],
        "double" => &[Double],
        "times_twenty" => &[TimesTwenty],
        "divide_by_two" => &[DivideByTwo],
        "divide_by_ten" => &[DivideByTen],
        "divide_by_one_hundred" => &[DivideByOneHundred],
        "divide_by_one_hundred_and_negate" => &[DivideByOneHundred, Negate],
        "divide_by_one_thousand" => &[DivideByOneThousand],
        "milliseconds_to_seconds" => &[MillisecondsToSeconds],
        "deciseconds_to_seconds" => &[DecisecondsToSeconds],
        "per_minute_to_per_second" => &[PerMinuteToPerSecond],
        _ => return None,
    };
    Some(Handler::scaling(transforms))
}

fn classify_display(keyword: &str) -> Option<Handler> {
    const DISPLAY_HANDLERS: &[&str] = &[
        "canonical_stat",
        "mod_value_to_item_class",
        "tempest_mod_text",
        "display_indexable_support",
        "passive_hash",
        "affliction_reward_type",
        "tree_expansion_jewel_passive",
        "weapon_tree_unique_base_type_name",
        "metamorphosis_reward_description",
    ];
    DISPLAY_HANDLERS
        .contains(&keyword)
        .then(|| Handler::display_only(HandlerArg::Stat))
}

fn classify_negating(keyword: &str) -> Option<Handler> {
    keyword
        .contains("negate")
        .then(|| Handler::scaling(&[ValueTransform::Negate]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_suffixes_are_dropped() {
        assert_eq!(
            base_handler_name("milliseconds_to_seconds_2dp"),
            "milliseconds_to_seconds"
        );
        assert_eq!(
            base_handler_name("per_minute_to_per_second_2dp_if_required"),
            "per_minute_to_per_second"
        );
        assert_eq!(
            base_handler_name("divide_by_ten_1dp_if_required"),
            "divide_by_ten"
        );
        assert_eq!(base_handler_name("negate"), "negate");
        assert_eq!(base_handler_name("times_twenty"), "times_twenty");
    }

    #[test]
    fn test_v1_classifies_scaling_variants() {
        let table = HandlerTable::v1();
        assert_eq!(
            table.classify("milliseconds_to_seconds_2dp"),
            Some(Handler::scaling(&[ValueTransform::MillisecondsToSeconds]))
        );
        assert_eq!(
            table.classify("divide_by_one_hundred_and_negate"),
            Some(Handler::scaling(&[
                ValueTransform::DivideByOneHundred,
                ValueTransform::Negate
            ]))
        );
    }

    #[test]
    fn test_unknown_negating_keyword_inverts_sign() {
        let handler = HandlerTable::v1()
            .classify("old_leech_percent_and_negate")
            .unwrap();
        assert_eq!(handler.transforms, vec![ValueTransform::Negate]);
        assert_eq!(handler.arg, HandlerArg::Stat);
    }

    #[test]
    fn test_argument_shapes() {
        let table = HandlerTable::v1();
        assert_eq!(table.classify("reminderstring").unwrap().arg, HandlerArg::Word);
        assert_eq!(table.classify("canonical_line").unwrap().arg, HandlerArg::None);
        let display = table.classify("mod_value_to_item_class").unwrap();
        assert_eq!(display.arg, HandlerArg::Stat);
        assert!(display.transforms.is_empty());
        assert_eq!(table.classify("plus_two_hundred"), None);
    }

    #[test]
    fn test_extra_rule_extends_table() {
        fn classify_thirty_percent(keyword: &str) -> Option<Handler> {
            (keyword == "30%_of_value").then(|| Handler::display_only(HandlerArg::Stat))
        }
        let table = HandlerTable::v1().with_rule(HandlerRule {
            name: "thirty_percent",
            classify: classify_thirty_percent,
        });
        assert_eq!(table.version(), 2);
        assert!(table.classify("30%_of_value").is_some());
    }
}
