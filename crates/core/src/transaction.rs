use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::rules::{Action, Condition, SplitAllocation};

/// Category sentinel used when no rule matched.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Venture sentinel used when the matched action names none.
pub const UNASSIGNED: &str = "unassigned";

/// A normalized transaction. `id` is a pure function of
/// `(source, date, description, row index)`, so re-parsing identical input
/// yields identical ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub source: String,
}

/// How a split leg relates to its parent transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub percent: Decimal,
    pub original_amount: Money,
    pub split_index: usize,
    pub total_splits: usize,
}

/// One step in the derivation of a categorization. Created once at
/// categorization time and never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AuditEntry {
    NoMatch,
    #[serde(rename_all = "camelCase")]
    MatchedRule {
        rule_id: String,
        when: Condition,
        then: Action,
    },
    #[serde(rename_all = "camelCase")]
    SplitAllocation {
        rule_id: String,
        when: Condition,
        then: Action,
        allocation: SplitAllocation,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub source: String,
    pub category: String,
    pub venture: String,
    pub requires_receipt: bool,
    pub note: String,
    pub audit: Vec<AuditEntry>,
    /// Parent transaction id; present on split-derived legs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_txn_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<Allocation>,
}

impl CategorizedTransaction {
    pub fn is_split_leg(&self) -> bool {
        self.allocation.is_some()
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}

/// A generated notice that a categorized transaction needs follow-up.
/// Emitted once per matched transaction, not once per split leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Alert {
    #[serde(rename_all = "camelCase")]
    MissingReceipt {
        txn_id: String,
        message: String,
        rule_id: String,
    },
}

impl Alert {
    pub fn txn_id(&self) -> &str {
        match self {
            Alert::MissingReceipt { txn_id, .. } => txn_id,
        }
    }

    pub fn rule_id(&self) -> &str {
        match self {
            Alert::MissingReceipt { rule_id, .. } => rule_id,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Alert::MissingReceipt { message, .. } => message,
        }
    }
}
