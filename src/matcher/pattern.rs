// SPDX-License-Identifier: PMPL-1.0-or-later

//! Compiled template patterns
//!
//! Each base-language line becomes one anchored regex. Literal runs are
//! escaped; every slot captures a number or the trade site's `#`
//! placeholder.

use crate::types::{PatternToken, StatLine, ValueClass};
use regex::Regex;

const UNSIGNED_SLOT: &str = r"([+-]?\d+(?:\.\d+)?|#)";
const SIGNED_SLOT: &str = r"([+-]\d+(?:\.\d+)?|\+#)";

#[derive(Debug, Clone)]
struct SlotCheck {
    stat: usize,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    slots: Vec<SlotCheck>,
    /// Longest literal run; a text that lacks it cannot match.
    anchor: String,
}

impl CompiledPattern {
    pub fn compile(line: &StatLine) -> Result<Self, regex::Error> {
        let mut source = String::from("^");
        let mut slots = Vec::new();
        let mut anchor = "";

        for token in &line.tokens {
            match token {
                PatternToken::Literal(text) => {
                    source.push_str(&regex::escape(text));
                    if text.len() > anchor.len() {
                        anchor = text.as_str();
                    }
                }
                PatternToken::Slot { stat, signed } => {
                    source.push_str(if *signed { SIGNED_SLOT } else { UNSIGNED_SLOT });
                    slots.push(SlotCheck { stat: *stat });
                }
            }
        }
        source.push('$');

        Ok(Self {
            regex: Regex::new(&source)?,
            slots,
            anchor: anchor.to_string(),
        })
    }

    /// True when `text` is generated by `line` with values its constraints
    /// allow. `line` must be the line this pattern was compiled from.
    pub fn matches(&self, line: &StatLine, text: &str) -> bool {
        if !text.contains(self.anchor.as_str()) {
            return false;
        }
        let Some(captures) = self.regex.captures(text) else {
            return false;
        };

        self.slots.iter().enumerate().all(|(index, slot)| {
            let Some(capture) = captures.get(index + 1) else {
                return false;
            };
            let raw = capture.as_str();
            if raw.ends_with('#') {
                return true;
            }
            let Ok(displayed) = raw.parse::<f64>() else {
                return false;
            };
            let class = line
                .value_classes
                .get(slot.stat)
                .copied()
                .unwrap_or(ValueClass::Any);
            class.admits(line.internal_value(slot.stat, displayed))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptions::{parse_template_line, ConstraintGrammar, HandlerTable};

    fn compiled(line: &str, stats: usize) -> (StatLine, CompiledPattern) {
        let line = parse_template_line(line, stats, &ConstraintGrammar::v1(), &HandlerTable::v1())
            .unwrap()
            .line;
        let pattern = CompiledPattern::compile(&line).unwrap();
        (line, pattern)
    }

    #[test]
    fn test_literal_line_requires_equality() {
        let (line, pattern) = compiled(r#"# "Cannot be Frozen""#, 1);
        assert!(pattern.matches(&line, "Cannot be Frozen"));
        assert!(!pattern.matches(&line, "Cannot be Frozen!"));
        assert!(!pattern.matches(&line, "cannot be Frozen"));
    }

    #[test]
    fn test_slot_accepts_any_number() {
        let (line, pattern) = compiled(r#"# "%1%%% increased Attack Speed""#, 1);
        assert!(pattern.matches(&line, "7% increased Attack Speed"));
        assert!(pattern.matches(&line, "125% increased Attack Speed"));
        assert!(pattern.matches(&line, "#% increased Attack Speed"));
        assert!(!pattern.matches(&line, "7% increased Cast Speed"));
        assert!(!pattern.matches(&line, "x% increased Attack Speed"));
    }

    #[test]
    fn test_value_class_is_checked_after_negation() {
        let (line, pattern) = compiled(r#"#|-1 "%1%%% reduced Attack Speed" negate 1"#, 1);
        assert!(pattern.matches(&line, "7% reduced Attack Speed"));
        // 0 displayed is 0 internal, outside #|-1
        assert!(!pattern.matches(&line, "0% reduced Attack Speed"));
    }

    #[test]
    fn test_exact_class_selects_singular() {
        let (line, pattern) = compiled(r#"1 "%1% additional Projectile""#, 1);
        assert!(pattern.matches(&line, "1 additional Projectile"));
        assert!(!pattern.matches(&line, "2 additional Projectile"));
    }

    #[test]
    fn test_signed_slot_needs_sign() {
        let (line, pattern) = compiled(r#"# "%1$+d to maximum Life""#, 1);
        assert!(pattern.matches(&line, "+70 to maximum Life"));
        assert!(pattern.matches(&line, "-5 to maximum Life"));
        assert!(pattern.matches(&line, "+# to maximum Life"));
        assert!(!pattern.matches(&line, "70 to maximum Life"));
    }

    #[test]
    fn test_scaled_slot_accepts_decimals() {
        let (line, pattern) = compiled(
            r#"1|# "%1% second Duration" milliseconds_to_seconds 1"#,
            1,
        );
        assert!(pattern.matches(&line, "1.5 second Duration"));
        assert!(!pattern.matches(&line, "0 second Duration"));
    }

    #[test]
    fn test_precision_variant_scales_before_class_check() {
        let (line, pattern) = compiled(
            r#"1|# "%1% second Duration" milliseconds_to_seconds_2dp 1"#,
            1,
        );
        assert!(pattern.matches(&line, "0.5 second Duration"));
    }

    #[test]
    fn test_scaled_exact_class_tolerates_rounding() {
        let (line, pattern) = compiled(r#"7 "%1%%% Chance" divide_by_one_hundred 1"#, 1);
        assert!(pattern.matches(&line, "0.07% Chance"));
        assert!(!pattern.matches(&line, "0.08% Chance"));
    }
}
