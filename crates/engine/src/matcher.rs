use regex::RegexBuilder;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use apportion_core::{Condition, RegexSpec, Transaction};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("amount_between bound `{bound}` is not numeric: {value}")]
    NonNumericBound { bound: &'static str, value: String },
}

/// Evaluate a condition against a transaction. Pure; the clauses present
/// are AND-composed, and an empty condition matches unconditionally.
///
/// The only error is a non-numeric `amount_between` bound, which signals a
/// broken rules document rather than a non-matching transaction. A regex
/// that fails to compile is deliberately softer: it warns and evaluates to
/// a non-match so one bad pattern cannot abort a whole run.
pub fn matches(tx: &Transaction, cond: &Condition) -> Result<bool, MatchError> {
    let desc = tx.description.to_lowercase();
    let amount = tx.amount.as_decimal();

    if let Some(keywords) = &cond.any_contains {
        if !contains_any(&desc, keywords) {
            return Ok(false);
        }
    }
    // `contains` is a legacy alias of `any_contains`; when both appear they
    // are applied independently and must both pass.
    if let Some(keywords) = &cond.contains {
        if !contains_any(&desc, keywords) {
            return Ok(false);
        }
    }
    if let Some(keywords) = &cond.all_contains {
        if !keywords.iter().all(|k| desc.contains(&k.to_lowercase())) {
            return Ok(false);
        }
    }
    if let Some(spec) = &cond.regex {
        if !regex_matches(spec, &desc) {
            return Ok(false);
        }
    }
    if let Some(gt) = cond.amount_gt {
        if amount <= gt {
            return Ok(false);
        }
    }
    if let Some(lt) = cond.amount_lt {
        if amount >= lt {
            return Ok(false);
        }
    }
    if let Some(range) = &cond.amount_between {
        let min = numeric_bound(&range.min, "min")?;
        let max = numeric_bound(&range.max, "max")?;
        if amount < min || amount > max {
            return Ok(false);
        }
    }

    Ok(true)
}

fn contains_any(desc: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| desc.contains(&k.to_lowercase()))
}

fn regex_matches(spec: &RegexSpec, desc: &str) -> bool {
    let mut builder = RegexBuilder::new(spec.pattern());
    match spec.flags() {
        Some(flags) => {
            builder
                .case_insensitive(flags.contains('i'))
                .multi_line(flags.contains('m'))
                .dot_matches_new_line(flags.contains('s'))
                .ignore_whitespace(flags.contains('x'));
        }
        None => {
            builder.case_insensitive(true);
        }
    }
    match builder.build() {
        Ok(re) => re.is_match(desc),
        Err(err) => {
            tracing::warn!(
                pattern = spec.pattern(),
                "invalid rule regex treated as non-match: {err}"
            );
            false
        }
    }
}

fn numeric_bound(value: &serde_json::Value, bound: &'static str) -> Result<Decimal, MatchError> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).map_err(|_| {
            MatchError::NonNumericBound {
                bound,
                value: value.to_string(),
            }
        }),
        _ => Err(MatchError::NonNumericBound {
            bound,
            value: value.to_string(),
        }),
    }
}
