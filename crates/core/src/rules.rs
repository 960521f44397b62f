use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rules document: an ordered list of rules plus an optional,
/// informational list of known venture names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventures: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Error, Debug)]
pub enum DocumentParseError {
    #[error("invalid JSON rules document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML rules document: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RulesDocument {
    pub fn from_json_str(text: &str) -> Result<Self, DocumentParseError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, DocumentParseError> {
        Ok(toml::from_str(text)?)
    }
}

/// A predicate/action pair. Higher `priority` is evaluated first; equal
/// priorities keep their declaration order. `when` and `then` are optional
/// at the type level so the validator, not the deserializer, reports their
/// absence against the offending rule id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<Action>,
}

/// A conjunction of optional predicate clauses. Absent clauses pass;
/// an entirely empty condition matches every transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_contains: Option<Vec<String>>,
    /// Legacy alias for `any_contains`. When both appear on one rule they
    /// are applied independently and must both pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_contains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<RegexSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_gt: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_lt: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_between: Option<AmountRange>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.any_contains.is_none()
            && self.contains.is_none()
            && self.all_contains.is_none()
            && self.regex.is_none()
            && self.amount_gt.is_none()
            && self.amount_lt.is_none()
            && self.amount_between.is_none()
    }
}

/// A regex clause: either a bare pattern or a pattern with explicit flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegexSpec {
    Pattern(String),
    WithFlags {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
}

impl RegexSpec {
    pub fn pattern(&self) -> &str {
        match self {
            RegexSpec::Pattern(p) => p,
            RegexSpec::WithFlags { pattern, .. } => pattern,
        }
    }

    pub fn flags(&self) -> Option<&str> {
        match self {
            RegexSpec::Pattern(_) => None,
            RegexSpec::WithFlags { flags, .. } => flags.as_deref(),
        }
    }
}

/// Inclusive amount range. Bounds stay loosely typed so that non-numeric
/// values surface as a match-time error instead of being coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: serde_json::Value,
    pub max: serde_json::Value,
}

/// What a matched rule does: either a simple assignment or a percentage
/// split across ventures. The two forms are distinguished by the presence
/// of `split`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Action {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venture: Option<String>,
    pub requires_receipt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<Vec<SplitAllocation>>,
}

impl Action {
    pub fn is_split(&self) -> bool {
        self.split.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitAllocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_document() {
        let doc = RulesDocument::from_json_str(
            r#"{
                "ventures": ["v1", "v2"],
                "rules": [
                    {"id": "r1", "when": {"contains": ["chatgpt"]},
                     "then": {"category": "Software", "venture": "v1"}},
                    {"id": "r2", "priority": 10,
                     "when": {"amount_gt": -50, "regex": "stripe|gumroad"},
                     "then": {"category": "Revenue", "requiresReceipt": true}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.ventures.as_deref(), Some(&["v1".to_string(), "v2".to_string()][..]));
        assert_eq!(doc.rules.len(), 2);
        assert_eq!(doc.rules[0].priority, 0);
        assert_eq!(doc.rules[1].priority, 10);
        let then = doc.rules[1].then.as_ref().unwrap();
        assert!(then.requires_receipt);
        assert!(!then.is_split());
    }

    #[test]
    fn parse_toml_document() {
        let doc = RulesDocument::from_toml_str(
            r#"
            [[rules]]
            id = "hosting"
            priority = 5

            [rules.when]
            any_contains = ["aws", "hetzner"]

            [rules.then]
            category = "Hosting"
            venture = "v1"
            "#,
        )
        .unwrap();
        assert_eq!(doc.rules.len(), 1);
        let when = doc.rules[0].when.as_ref().unwrap();
        assert_eq!(when.any_contains.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn parse_split_action() {
        let doc = RulesDocument::from_json_str(
            r#"{"rules": [{"id": "s", "when": {},
                "then": {"category": "Shared",
                         "split": [{"venture": "a", "percent": 60},
                                   {"venture": "b", "percent": 40, "note": "b's share"}]}}]}"#,
        )
        .unwrap();
        let then = doc.rules[0].then.as_ref().unwrap();
        assert!(then.is_split());
        let split = then.split.as_ref().unwrap();
        assert_eq!(split[0].percent, Some(Decimal::from(60)));
        assert_eq!(split[1].note.as_deref(), Some("b's share"));
    }

    #[test]
    fn regex_spec_both_forms() {
        let bare: RegexSpec = serde_json::from_str(r#""^aws""#).unwrap();
        assert_eq!(bare.pattern(), "^aws");
        assert_eq!(bare.flags(), None);

        let flagged: RegexSpec =
            serde_json::from_str(r#"{"pattern": "^aws", "flags": "im"}"#).unwrap();
        assert_eq!(flagged.pattern(), "^aws");
        assert_eq!(flagged.flags(), Some("im"));
    }

    #[test]
    fn empty_condition_reports_empty() {
        assert!(Condition::default().is_empty());
        let c = Condition {
            amount_lt: Some(Decimal::ZERO),
            ..Condition::default()
        };
        assert!(!c.is_empty());
    }

    #[test]
    fn missing_when_then_deserialize_as_none() {
        let doc = RulesDocument::from_json_str(r#"{"rules": [{"id": "bare"}]}"#).unwrap();
        assert!(doc.rules[0].when.is_none());
        assert!(doc.rules[0].then.is_none());
    }
}
