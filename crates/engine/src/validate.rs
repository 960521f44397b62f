use rust_decimal::Decimal;
use thiserror::Error;

use apportion_core::{DocumentParseError, RulesDocument};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error(transparent)]
    Parse(#[from] DocumentParseError),
    #[error("rule at index {index} has an empty id")]
    MissingId { index: usize },
    #[error("rule {rule_id:?} is missing its `when` condition")]
    MissingWhen { rule_id: String },
    #[error("rule {rule_id:?} is missing its `then` action")]
    MissingThen { rule_id: String },
    #[error("rule {rule_id:?} has a split allocation without a venture")]
    SplitMissingVenture { rule_id: String },
    #[error("rule {rule_id:?} has a split percent that is not a positive number")]
    SplitBadPercent { rule_id: String },
    #[error("rule {rule_id:?} split percents sum to {sum}, expected 100")]
    SplitSumMismatch { rule_id: String, sum: Decimal },
}

/// Structural and cross-field validation of a rules document. Fails fast
/// on the first violation, naming the offending rule. Conditions are not
/// evaluated against any transaction here.
pub fn validate(doc: &RulesDocument) -> Result<(), ValidationError> {
    for (index, rule) in doc.rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            return Err(ValidationError::MissingId { index });
        }
        if rule.when.is_none() {
            return Err(ValidationError::MissingWhen {
                rule_id: rule.id.clone(),
            });
        }
        let Some(then) = &rule.then else {
            return Err(ValidationError::MissingThen {
                rule_id: rule.id.clone(),
            });
        };
        if let Some(split) = &then.split {
            let mut sum = Decimal::ZERO;
            for alloc in split {
                if alloc.venture.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err(ValidationError::SplitMissingVenture {
                        rule_id: rule.id.clone(),
                    });
                }
                match alloc.percent {
                    Some(p) if p > Decimal::ZERO => sum += p,
                    _ => {
                        return Err(ValidationError::SplitBadPercent {
                            rule_id: rule.id.clone(),
                        })
                    }
                }
            }
            if (sum - Decimal::ONE_HUNDRED).abs() > split_sum_tolerance() {
                return Err(ValidationError::SplitSumMismatch {
                    rule_id: rule.id.clone(),
                    sum,
                });
            }
        }
    }
    Ok(())
}

/// Parse a JSON rules document and validate it in one step.
pub fn load_json(text: &str) -> Result<RulesDocument, ValidationError> {
    let doc = RulesDocument::from_json_str(text)?;
    validate(&doc)?;
    Ok(doc)
}

/// Parse a TOML rules document and validate it in one step.
pub fn load_toml(text: &str) -> Result<RulesDocument, ValidationError> {
    let doc = RulesDocument::from_toml_str(text)?;
    validate(&doc)?;
    Ok(doc)
}

/// Split percents must sum to 100 within ±0.01.
fn split_sum_tolerance() -> Decimal {
    Decimal::new(1, 2)
}
