// SPDX-License-Identifier: PMPL-1.0-or-later

//! Template line sub-parser
//!
//! A line reads `<constraint per stat> "<text>" [handler [arg]]...`, for
//! example `#|-1 "%1%%% reduced Physical Damage" negate 1`. A line without a
//! quoted text is taken as bare text with an open constraint per stat.

use crate::descriptions::grammar::ConstraintGrammar;
use crate::descriptions::handlers::{HandlerArg, HandlerTable};
use crate::types::{PatternToken, StatLine, ValueClass, ValueTransform};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unclassified constraint token '{0}'")]
    Unclassified(String),
    #[error("{0}")]
    Malformed(String),
}

/// A parsed line plus the handler keywords no rule classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub line: StatLine,
    pub unclassified_handlers: Vec<String>,
}

pub fn parse_template_line(
    line: &str,
    stat_count: usize,
    grammar: &ConstraintGrammar,
    handlers: &HandlerTable,
) -> Result<ParsedLine, LineError> {
    let (value_classes, text, tail) = match line.find('"') {
        None => (vec![ValueClass::Any; stat_count], line, ""),
        Some(open) => {
            let after = &line[open + 1..];
            let close = after
                .find('"')
                .ok_or_else(|| LineError::Malformed("unterminated template text".to_string()))?;
            let classes = parse_constraints(&line[..open], stat_count, grammar)?;
            (classes, &after[..close], &after[close + 1..])
        }
    };

    let (transforms, unclassified_handlers) = parse_handlers(tail, stat_count, handlers)?;
    let (template_text, tokens) = tokenize_template(text, stat_count)?;
    let arity_signature = value_classes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(ParsedLine {
        line: StatLine {
            arity_signature,
            template_text,
            value_classes,
            transforms,
            tokens,
        },
        unclassified_handlers,
    })
}

fn parse_constraints(
    head: &str,
    stat_count: usize,
    grammar: &ConstraintGrammar,
) -> Result<Vec<ValueClass>, LineError> {
    let tokens: Vec<&str> = head.split_whitespace().collect();
    if tokens.len() != stat_count {
        return Err(LineError::Malformed(format!(
            "expected {} constraint tokens, found {}",
            stat_count,
            tokens.len()
        )));
    }
    tokens
        .into_iter()
        .map(|token| {
            grammar
                .classify(token)
                .ok_or_else(|| LineError::Unclassified(token.to_string()))
        })
        .collect()
}

type HandlerChains = (Vec<Vec<ValueTransform>>, Vec<String>);

fn parse_handlers(
    tail: &str,
    stat_count: usize,
    handlers: &HandlerTable,
) -> Result<HandlerChains, LineError> {
    let mut transforms = vec![Vec::new(); stat_count];
    let mut unclassified = Vec::new();
    let mut words = tail.split_whitespace().peekable();

    while let Some(word) = words.next() {
        let Some(handler) = handlers.classify(word) else {
            unclassified.push(word.to_string());
            // Assume a trailing stat index belongs to the unknown keyword.
            if words
                .peek()
                .is_some_and(|next| next.parse::<usize>().is_ok())
            {
                words.next();
            }
            continue;
        };
        match handler.arg {
            HandlerArg::None => {}
            HandlerArg::Word => {
                words.next();
            }
            HandlerArg::Stat => {
                let index = words
                    .next()
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .filter(|index| (1..=stat_count).contains(index))
                    .ok_or_else(|| {
                        LineError::Malformed(format!(
                            "handler '{}' needs a stat index between 1 and {}",
                            word, stat_count
                        ))
                    })?;
                transforms[index - 1].extend(handler.transforms);
            }
        }
    }

    Ok((transforms, unclassified))
}

/// Splits display text into literal runs and numeric slots.
///
/// Returns the text with every slot written as `#` (`+#` when the slot
/// prints an explicit sign) and `%%` collapsed, plus the token sequence.
pub fn tokenize_template(
    text: &str,
    stat_count: usize,
) -> Result<(String, Vec<PatternToken>), LineError> {
    let chars: Vec<char> = text.chars().collect();
    let mut builder = TemplateBuilder::new(stat_count);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '%' => {
                if let Some((stat, signed, len)) = percent_placeholder(&chars[i..]) {
                    builder.slot(Some(stat), signed)?;
                    i += len;
                } else if chars.get(i + 1) == Some(&'%') {
                    builder.literal('%');
                    i += 2;
                } else {
                    builder.literal('%');
                    i += 1;
                }
            }
            '{' => {
                if let Some((stat, signed, len)) = brace_placeholder(&chars[i..]) {
                    builder.slot(stat, signed)?;
                    i += len;
                } else {
                    builder.literal('{');
                    i += 1;
                }
            }
            '#' => {
                builder.slot(None, false)?;
                i += 1;
            }
            c => {
                builder.literal(c);
                i += 1;
            }
        }
    }

    Ok(builder.finish())
}

struct TemplateBuilder {
    stat_count: usize,
    next_sequential: usize,
    text: String,
    literal: String,
    tokens: Vec<PatternToken>,
}

impl TemplateBuilder {
    fn new(stat_count: usize) -> Self {
        Self {
            stat_count,
            next_sequential: 0,
            text: String::new(),
            literal: String::new(),
            tokens: Vec::new(),
        }
    }

    fn literal(&mut self, c: char) {
        self.text.push(c);
        self.literal.push(c);
    }

    fn slot(&mut self, stat: Option<usize>, signed: bool) -> Result<(), LineError> {
        let stat = match stat {
            Some(stat) => stat,
            None => {
                self.next_sequential += 1;
                self.next_sequential - 1
            }
        };
        if stat >= self.stat_count {
            return Err(LineError::Malformed(format!(
                "placeholder refers to stat {} of {}",
                stat + 1,
                self.stat_count
            )));
        }
        self.flush_literal();
        self.text.push_str(if signed { "+#" } else { "#" });
        self.tokens.push(PatternToken::Slot { stat, signed });
        Ok(())
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            self.tokens
                .push(PatternToken::Literal(std::mem::take(&mut self.literal)));
        }
    }

    fn finish(mut self) -> (String, Vec<PatternToken>) {
        self.flush_literal();
        (self.text, self.tokens)
    }
}

/// `%N%`, `%N$d` or `%N$+d`; `N` is 1-based. Returns (stat, signed, length).
fn percent_placeholder(chars: &[char]) -> Option<(usize, bool, usize)> {
    let digits = chars[1..].iter().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let number: usize = chars[1..1 + digits].iter().collect::<String>().parse().ok()?;
    let stat = number.checked_sub(1)?;
    let rest = &chars[1 + digits..];
    match rest {
        ['%', ..] => Some((stat, false, digits + 2)),
        ['$', 'd', ..] => Some((stat, false, digits + 3)),
        ['$', '+', 'd', ..] => Some((stat, true, digits + 4)),
        _ => None,
    }
}

/// `{}`, `{N}` or `{N:+d}` / `{N:d}`; `N` is 0-based.
fn brace_placeholder(chars: &[char]) -> Option<(Option<usize>, bool, usize)> {
    let close = chars.iter().position(|c| *c == '}')?;
    let inner: String = chars[1..close].iter().collect();
    let (index, format) = match inner.split_once(':') {
        Some((index, format)) => (index, Some(format)),
        None => (inner.as_str(), None),
    };
    let stat = if index.is_empty() {
        None
    } else {
        Some(index.parse::<usize>().ok()?)
    };
    let signed = match format {
        None | Some("d") => false,
        Some("+d") => true,
        Some(_) => return None,
    };
    Some((stat, signed, close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str, stats: usize) -> Result<StatLine, LineError> {
        parse_template_line(line, stats, &ConstraintGrammar::v1(), &HandlerTable::v1())
            .map(|parsed| parsed.line)
    }

    #[test]
    fn test_percent_placeholders_normalize_to_hash() {
        let line = parse(r#"1|# "%1%%% increased Physical Damage""#, 1).unwrap();
        assert_eq!(line.arity_signature, "1|#");
        assert_eq!(line.template_text, "#% increased Physical Damage");
        assert_eq!(line.slot_count(), 1);
    }

    #[test]
    fn test_signed_placeholder_keeps_plus() {
        let line = parse(r#"# "%1$+d to maximum Life""#, 1).unwrap();
        assert_eq!(line.template_text, "+# to maximum Life");
        assert_eq!(
            line.tokens[0],
            PatternToken::Slot {
                stat: 0,
                signed: true
            }
        );
    }

    #[test]
    fn test_negate_handler_recorded() {
        let line = parse(r#"#|-1 "%1%%% reduced Physical Damage" negate 1"#, 1).unwrap();
        assert!(line.inverts_sign());
        assert_eq!(line.internal_value(0, 40.0), -40.0);
    }

    #[test]
    fn test_two_stat_line() {
        let line = parse(r#"# # "Adds %1% to %2% Fire Damage""#, 2).unwrap();
        assert_eq!(line.arity_signature, "# #");
        assert_eq!(line.template_text, "Adds # to # Fire Damage");
        assert_eq!(line.slot_count(), 2);
    }

    #[test]
    fn test_bare_line_uses_open_constraints() {
        let line = parse("#% increased Physical Damage", 1).unwrap();
        assert_eq!(line.arity_signature, "#");
        assert_eq!(line.template_text, "#% increased Physical Damage");
    }

    #[test]
    fn test_brace_placeholders() {
        let line = parse(r#"# # "{0:+d} to {1} Armour""#, 2).unwrap();
        assert_eq!(line.template_text, "+# to # Armour");
    }

    #[test]
    fn test_reminderstring_and_display_handlers_are_skipped() {
        let line = parse(
            r#"# "%1% seconds" milliseconds_to_seconds 1 reminderstring ReminderTextFoo canonical_line"#,
            1,
        )
        .unwrap();
        assert_eq!(line.internal_value(0, 1.5), 1500.0);
        assert!(!line.inverts_sign());
    }

    #[test]
    fn test_precision_variant_keeps_its_transform() {
        let line = parse(
            r#"1|# "%1% second Duration" milliseconds_to_seconds_2dp 1"#,
            1,
        )
        .unwrap();
        assert_eq!(line.internal_value(0, 0.5), 500.0);
    }

    #[test]
    fn test_combined_scale_and_negate() {
        let line = parse(
            r#"#|-1 "%1%%% reduced Mana Cost" divide_by_one_hundred_and_negate 1"#,
            1,
        )
        .unwrap();
        assert!(line.inverts_sign());
        assert_eq!(line.internal_value(0, 0.5), -50.0);
    }

    #[test]
    fn test_unknown_handler_is_reported_and_line_kept() {
        let parsed = parse_template_line(
            r#"# "%1% to Foo" plus_two_hundred 1 negate 1"#,
            1,
            &ConstraintGrammar::v1(),
            &HandlerTable::v1(),
        )
        .unwrap();
        assert_eq!(parsed.unclassified_handlers, vec!["plus_two_hundred".to_string()]);
        assert!(parsed.line.inverts_sign());
    }

    #[test]
    fn test_constraint_count_mismatch_is_malformed() {
        let err = parse(r#"# # "%1% Life""#, 1).unwrap_err();
        assert!(matches!(err, LineError::Malformed(_)));
    }

    #[test]
    fn test_unknown_constraint_is_unclassified() {
        let err = parse(r#"1..5 "%1% Life""#, 1).unwrap_err();
        assert_eq!(err, LineError::Unclassified("1..5".to_string()));
    }

    #[test]
    fn test_out_of_range_placeholder_is_malformed() {
        let err = parse(r#"# "%2% Life""#, 1).unwrap_err();
        assert!(matches!(err, LineError::Malformed(_)));
    }

    #[test]
    fn test_unterminated_text_is_malformed() {
        assert!(parse(r#"# "%1% Life"#, 1).is_err());
    }
}
