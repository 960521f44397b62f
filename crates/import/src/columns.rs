//! Header-name driven column resolution.
//!
//! Each logical field carries a prioritized alias list; the first alias
//! that matches a header (case-insensitive, whitespace-trimmed) wins.
//! Extra columns are ignored, so superset exports resolve cleanly.

use csv::StringRecord;

const DATE_ALIASES: &[&str] = &[
    "date",
    "transaction date",
    "posting date",
    "posted date",
    "post date",
];
const DESCRIPTION_ALIASES: &[&str] = &["description", "payee", "merchant", "name", "details"];
const AMOUNT_ALIASES: &[&str] = &["amount", "transaction amount", "amt"];
const MEMO_ALIASES: &[&str] = &["memo", "notes", "note", "extended details"];
const TYPE_ALIASES: &[&str] = &["type", "transaction type"];
const DEBIT_ALIASES: &[&str] = &["debit", "withdrawal", "withdrawals", "debit amount"];
const CREDIT_ALIASES: &[&str] = &["credit", "deposit", "deposits", "credit amount"];
const STATUS_ALIASES: &[&str] = &["status", "state"];

/// Resolved positions of the logical fields within one header row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub description: Option<usize>,
    pub amount: Option<usize>,
    pub memo: Option<usize>,
    pub txn_type: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub status: Option<usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &StringRecord) -> Self {
        ColumnMap {
            date: find(headers, DATE_ALIASES),
            description: find(headers, DESCRIPTION_ALIASES),
            amount: find(headers, AMOUNT_ALIASES),
            memo: find(headers, MEMO_ALIASES),
            txn_type: find(headers, TYPE_ALIASES),
            debit: find(headers, DEBIT_ALIASES),
            credit: find(headers, CREDIT_ALIASES),
            status: find(headers, STATUS_ALIASES),
        }
    }
}

fn find(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        for (i, header) in headers.iter().enumerate() {
            if header.trim().eq_ignore_ascii_case(alias) {
                return Some(i);
            }
        }
    }
    None
}
