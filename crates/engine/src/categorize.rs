use apportion_core::{
    Alert, Allocation, AuditEntry, CategorizedTransaction, Rule, RulesDocument, Transaction,
    UNASSIGNED, UNCATEGORIZED,
};

use crate::matcher::MatchError;
use crate::selector::RuleSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizeOutput {
    pub categorized: Vec<CategorizedTransaction>,
    pub alerts: Vec<Alert>,
}

/// Apply a rules document to a batch of transactions. Output preserves
/// input order; split legs appear contiguously, in allocation order, where
/// the parent would have appeared.
///
/// The caller must validate the document first (`validate`); this function
/// only fails when condition evaluation itself fails (`MatchError`).
pub fn categorize(
    transactions: &[Transaction],
    doc: &RulesDocument,
) -> Result<CategorizeOutput, MatchError> {
    let rules = RuleSet::new(doc);
    let mut out = CategorizeOutput::default();
    for tx in transactions {
        match rules.select(tx)? {
            Some(rule) => apply_rule(tx, rule, &mut out),
            None => out.categorized.push(no_match(tx)),
        }
    }
    Ok(out)
}

fn no_match(tx: &Transaction) -> CategorizedTransaction {
    CategorizedTransaction {
        id: tx.id.clone(),
        date: tx.date,
        description: tx.description.clone(),
        amount: tx.amount,
        source: tx.source.clone(),
        category: UNCATEGORIZED.to_string(),
        venture: UNASSIGNED.to_string(),
        requires_receipt: false,
        note: String::new(),
        audit: vec![AuditEntry::NoMatch],
        original_txn_id: None,
        allocation: None,
    }
}

fn apply_rule(tx: &Transaction, rule: &Rule, out: &mut CategorizeOutput) {
    let when = rule.when.clone().unwrap_or_default();
    let then = rule.then.clone().unwrap_or_default();
    let category = then
        .category
        .clone()
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    match &then.split {
        None => {
            out.categorized.push(CategorizedTransaction {
                id: tx.id.clone(),
                date: tx.date,
                description: tx.description.clone(),
                amount: tx.amount,
                source: tx.source.clone(),
                category,
                venture: then
                    .venture
                    .clone()
                    .unwrap_or_else(|| UNASSIGNED.to_string()),
                requires_receipt: then.requires_receipt,
                note: then.note.clone().unwrap_or_default(),
                audit: vec![AuditEntry::MatchedRule {
                    rule_id: rule.id.clone(),
                    when: when.clone(),
                    then: then.clone(),
                }],
                original_txn_id: None,
                allocation: None,
            });
            if then.requires_receipt {
                out.alerts.push(Alert::MissingReceipt {
                    txn_id: tx.id.clone(),
                    message: format!("{} ({}) requires a receipt", tx.description, tx.date),
                    rule_id: rule.id.clone(),
                });
            }
        }
        Some(split) => {
            for (i, alloc) in split.iter().enumerate() {
                // Each leg is computed directly from its percent; legs sum
                // back to the parent because the percents sum to 100.
                let percent = alloc.percent.unwrap_or_default();
                out.categorized.push(CategorizedTransaction {
                    id: format!("{}:split:{}", tx.id, i),
                    date: tx.date,
                    description: tx.description.clone(),
                    amount: tx.amount.percent_of(percent),
                    source: tx.source.clone(),
                    category: category.clone(),
                    venture: alloc
                        .venture
                        .clone()
                        .unwrap_or_else(|| UNASSIGNED.to_string()),
                    requires_receipt: then.requires_receipt,
                    note: alloc.note.clone().unwrap_or_default(),
                    audit: vec![AuditEntry::SplitAllocation {
                        rule_id: rule.id.clone(),
                        when: when.clone(),
                        then: then.clone(),
                        allocation: alloc.clone(),
                    }],
                    original_txn_id: Some(tx.id.clone()),
                    allocation: Some(Allocation {
                        percent,
                        original_amount: tx.amount,
                        split_index: i,
                        total_splits: split.len(),
                    }),
                });
            }
            // One alert for the parent, not one per leg.
            if then.requires_receipt {
                out.alerts.push(Alert::MissingReceipt {
                    txn_id: tx.id.clone(),
                    message: format!(
                        "{} ({}) requires a receipt; amount split across {} allocations",
                        tx.description,
                        tx.date,
                        split.len()
                    ),
                    rule_id: rule.id.clone(),
                });
            }
        }
    }
}
