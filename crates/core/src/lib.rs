pub mod money;
pub mod rules;
pub mod transaction;

pub use money::Money;
pub use rules::{
    Action, AmountRange, Condition, DocumentParseError, RegexSpec, Rule, RulesDocument,
    SplitAllocation,
};
pub use transaction::{
    Alert, Allocation, AuditEntry, CategorizedTransaction, Transaction, UNASSIGNED, UNCATEGORIZED,
};
