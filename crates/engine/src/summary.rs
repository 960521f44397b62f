use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use apportion_core::{CategorizedTransaction, Money};

/// Reports stop after this many uncategorized merchants.
const TOP_UNCATEGORIZED_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantTally {
    pub description: String,
    pub count: usize,
    pub total: Money,
}

/// Derived statistics over a categorized set. Recomputable at any time;
/// never a source of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub by_venture: BTreeMap<String, Money>,
    pub by_category: BTreeMap<String, Money>,
    pub by_venture_category: BTreeMap<String, BTreeMap<String, Money>>,
    pub uncategorized_count: usize,
    pub top_uncategorized: Vec<MerchantTally>,
    pub total_transactions: usize,
}

/// Pure reducer over the full post-split set; each split leg counts as its
/// own transaction.
pub fn summarize(categorized: &[CategorizedTransaction]) -> Summary {
    let mut summary = Summary {
        total_transactions: categorized.len(),
        ..Summary::default()
    };
    // Grouping is strictly by description string; insertion order is kept
    // so equal counts resolve to the first-encountered merchant.
    let mut tally_index: HashMap<String, usize> = HashMap::new();
    let mut tallies: Vec<MerchantTally> = Vec::new();

    for tx in categorized {
        *summary
            .by_venture
            .entry(tx.venture.clone())
            .or_insert_with(Money::zero) += tx.amount;
        *summary
            .by_category
            .entry(tx.category.clone())
            .or_insert_with(Money::zero) += tx.amount;
        *summary
            .by_venture_category
            .entry(tx.venture.clone())
            .or_default()
            .entry(tx.category.clone())
            .or_insert_with(Money::zero) += tx.amount;

        if tx.is_uncategorized() {
            summary.uncategorized_count += 1;
            match tally_index.entry(tx.description.clone()) {
                Entry::Occupied(entry) => {
                    let i = *entry.get();
                    tallies[i].count += 1;
                    tallies[i].total += tx.amount;
                }
                Entry::Vacant(entry) => {
                    entry.insert(tallies.len());
                    tallies.push(MerchantTally {
                        description: tx.description.clone(),
                        count: 1,
                        total: tx.amount,
                    });
                }
            }
        }
    }

    // Stable sort: ties keep first-encountered order.
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies.truncate(TOP_UNCATEGORIZED_CAP);
    summary.top_uncategorized = tallies;
    summary
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncategorizedReport {
    pub uncategorized_count: usize,
    pub uncategorized: Vec<CategorizedTransaction>,
}

/// The subset of the categorized output that no rule matched.
pub fn uncategorized(categorized: &[CategorizedTransaction]) -> UncategorizedReport {
    let uncategorized: Vec<_> = categorized
        .iter()
        .filter(|tx| tx.is_uncategorized())
        .cloned()
        .collect();
    UncategorizedReport {
        uncategorized_count: uncategorized.len(),
        uncategorized,
    }
}
