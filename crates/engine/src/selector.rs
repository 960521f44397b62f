use apportion_core::{Rule, RulesDocument, Transaction};

use crate::matcher::{matches, MatchError};

/// Rules ordered for evaluation: priority descending, declaration order as
/// the tie-break. First match wins.
pub struct RuleSet<'a> {
    ordered: Vec<&'a Rule>,
}

impl<'a> RuleSet<'a> {
    pub fn new(doc: &'a RulesDocument) -> Self {
        let mut ordered: Vec<&Rule> = doc.rules.iter().collect();
        // sort_by is stable: equal priorities keep their document order.
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        RuleSet { ordered }
    }

    pub fn select(&self, tx: &Transaction) -> Result<Option<&'a Rule>, MatchError> {
        for &rule in &self.ordered {
            let matched = match &rule.when {
                Some(cond) => matches(tx, cond)?,
                None => true,
            };
            if matched {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

/// One-shot selection against a document.
pub fn select<'a>(
    tx: &Transaction,
    doc: &'a RulesDocument,
) -> Result<Option<&'a Rule>, MatchError> {
    RuleSet::new(doc).select(tx)
}
