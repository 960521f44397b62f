use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::str::FromStr;
use thiserror::Error;

use apportion_core::{Money, Transaction};

use crate::columns::ColumnMap;

/// Separator used when a memo column is folded into the description.
/// Fixed so identical inputs always produce identical descriptions, which
/// the deterministic id depends on.
pub const MEMO_SEPARATOR: &str = " | ";

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("empty input: no header row found")]
    EmptyInput,
    #[error("missing required columns: expected {expected:?}, found headers {found:?}")]
    MissingColumns {
        expected: Vec<&'static str>,
        found: Vec<String>,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowErrorKind {
    #[error("unparsable date: {0:?}")]
    InvalidDate(String),
    #[error("empty description")]
    EmptyDescription,
    #[error("unparsable amount: {0:?}")]
    InvalidAmount(String),
}

/// A single row that failed field-level validation. Never fatal to the
/// import; collected in validating mode, skipped in best-effort mode.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row}: {kind}")]
pub struct RowError {
    /// Zero-based position among the data rows of the raw input.
    pub row: usize,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedImport {
    pub transactions: Vec<Transaction>,
    pub row_errors: Vec<RowError>,
}

/// The per-source adapters. Enum dispatch keeps the set closed and the
/// sign conventions next to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Header-mapped export with a single signed amount column, taken as-is.
    Generic,
    /// Card statement with a type column; sales are forced negative,
    /// returns and payments positive, regardless of the raw sign.
    CardStatement,
    /// Ledger with separate debit/credit columns; `amount = credit − debit`,
    /// zero-amount and pending rows are dropped.
    DebitCredit,
}

const ALL_SOURCES: &[SourceKind] = &[
    SourceKind::Generic,
    SourceKind::CardStatement,
    SourceKind::DebitCredit,
];

impl SourceKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::CardStatement => "card",
            Self::DebitCredit => "debit_credit",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic bank export",
            Self::CardStatement => "Card statement",
            Self::DebitCredit => "Debit/credit ledger",
        }
    }

    pub fn from_key(key: &str) -> Option<SourceKind> {
        ALL_SOURCES.iter().find(|s| s.key() == key).copied()
    }

    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Generic => &["date", "description", "amount"],
            Self::CardStatement => &["date", "description", "amount", "type"],
            Self::DebitCredit => &["date", "description", "debit", "credit"],
        }
    }

    fn has_required_columns(&self, map: &ColumnMap) -> bool {
        let base = map.date.is_some() && map.description.is_some();
        match self {
            Self::Generic => base && map.amount.is_some(),
            Self::CardStatement => base && map.amount.is_some() && map.txn_type.is_some(),
            Self::DebitCredit => base && map.debit.is_some() && map.credit.is_some(),
        }
    }

    /// Parse one data row. `Ok(None)` means the row is dropped by design
    /// (zero amount or pending status), not that it failed.
    fn parse_row(
        &self,
        record: &csv::StringRecord,
        map: &ColumnMap,
        row_index: usize,
    ) -> Result<Option<Transaction>, RowErrorKind> {
        if *self == Self::DebitCredit {
            let status = field(record, map.status);
            if status.trim().eq_ignore_ascii_case("pending") {
                return Ok(None);
            }
        }

        let date_raw = field(record, map.date);
        let date = parse_date(date_raw)
            .ok_or_else(|| RowErrorKind::InvalidDate(date_raw.trim().to_string()))?;

        let mut description = field(record, map.description).trim().to_string();
        let memo = field(record, map.memo).trim();
        if !memo.is_empty() {
            description.push_str(MEMO_SEPARATOR);
            description.push_str(memo);
        }
        if description.is_empty() {
            return Err(RowErrorKind::EmptyDescription);
        }

        let amount = match self {
            Self::Generic => parse_amount(field(record, map.amount))?,
            Self::CardStatement => {
                let raw = parse_amount(field(record, map.amount))?;
                match field(record, map.txn_type).trim().to_lowercase().as_str() {
                    "sale" => -raw.abs(),
                    "return" | "payment" => raw.abs(),
                    _ => raw,
                }
            }
            Self::DebitCredit => {
                let debit = parse_optional_amount(field(record, map.debit))?;
                let credit = parse_optional_amount(field(record, map.credit))?;
                let amount = credit - debit;
                if amount.is_zero() {
                    return Ok(None);
                }
                amount
            }
        };

        let id = transaction_id(self.key(), date, &description, row_index);
        Ok(Some(Transaction {
            id,
            date,
            description,
            amount,
            source: self.key().to_string(),
        }))
    }
}

/// Best-effort normalization: malformed rows are skipped with a warning.
pub fn normalize(raw_text: &str, source: SourceKind) -> Result<Vec<Transaction>, FormatError> {
    let import = normalize_validating(raw_text, source)?;
    for err in &import.row_errors {
        tracing::warn!(source = source.key(), "skipping {err}");
    }
    Ok(import.transactions)
}

/// Validating normalization: malformed rows are collected as `RowError`s
/// alongside the rows that parsed, so the caller can proceed with partial
/// data and show per-row diagnostics.
pub fn normalize_validating(
    raw_text: &str,
    source: SourceKind,
) -> Result<NormalizedImport, FormatError> {
    if raw_text.trim().is_empty() {
        return Err(FormatError::EmptyInput);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw_text.as_bytes());
    let headers = reader.headers()?.clone();

    let map = ColumnMap::resolve(&headers);
    if !source.has_required_columns(&map) {
        return Err(FormatError::MissingColumns {
            expected: source.required_columns().to_vec(),
            found: headers.iter().map(|h| h.trim().to_string()).collect(),
        });
    }

    let mut import = NormalizedImport::default();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match source.parse_row(&record, &map, row_index) {
            Ok(Some(tx)) => import.transactions.push(tx),
            Ok(None) => {}
            Err(kind) => import.row_errors.push(RowError { row: row_index, kind }),
        }
    }
    Ok(import)
}

/// Deterministic transaction id: `<source>:<first 16 hex chars of
/// SHA-256("<source>|<iso-date>|<description>|<row-index>")>`. A pure
/// function of its inputs, so re-parsing identical input yields identical
/// ids.
pub fn transaction_id(
    source: &str,
    date: NaiveDate,
    description: &str,
    row_index: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(description.as_bytes());
    hasher.update(b"|");
    hasher.update(row_index.to_string().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{source}:{}", &digest[..16])
}

fn field<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

/// Lex a raw amount, tolerating `$`, thousands commas, surrounding
/// whitespace, and accounting parentheses for negatives.
fn parse_amount(raw: &str) -> Result<Money, RowErrorKind> {
    let s = raw.trim();
    let (negative, s) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let mut value = Decimal::from_str(&cleaned)
        .map_err(|_| RowErrorKind::InvalidAmount(raw.trim().to_string()))?;
    if negative {
        value = -value;
    }
    Ok(Money::new(value))
}

/// Like `parse_amount` but an empty field reads as zero, which is how
/// debit/credit ledgers leave the unused side blank.
fn parse_optional_amount(raw: &str) -> Result<Money, RowErrorKind> {
    if raw.trim().is_empty() {
        return Ok(Money::zero());
    }
    parse_amount(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    // ── amount and date lexing ────────────────────────────────────────────────

    #[test]
    fn parse_amount_tolerates_formatting() {
        assert_eq!(parse_amount("1,234.56").unwrap(), money("1234.56"));
        assert_eq!(parse_amount("$99.99").unwrap(), money("99.99"));
        assert_eq!(parse_amount("(75.25)").unwrap(), money("-75.25"));
        assert_eq!(parse_amount("  -42.50  ").unwrap(), money("-42.50"));
        assert!(parse_amount("not_a_number").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn parse_date_conventions() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_date("2025-01-15"), Some(expected));
        assert_eq!(parse_date("01/15/2025"), Some(expected));
        assert_eq!(parse_date("1/15/2025"), Some(expected));
        assert_eq!(parse_date("01-15-2025"), Some(expected));
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("13/40/2025"), None);
    }

    // ── generic adapter ───────────────────────────────────────────────────────

    #[test]
    fn generic_takes_amount_as_is() {
        let csv = "Date,Description,Amount\n\
                   2025-01-15,STRIPE PAYOUT,2500.00\n\
                   2025-01-16,ADOBE CREATIVE,-54.99\n";
        let txs = normalize(csv, SourceKind::Generic).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, money("2500.00"));
        assert_eq!(txs[1].amount, money("-54.99"));
        assert_eq!(txs[0].source, "generic");
    }

    #[test]
    fn quoted_fields_may_embed_the_delimiter() {
        let csv = "Date,Description,Amount\n\
                   2025-01-15,\"ACME, INC\",\"1,200.00\"\n";
        let txs = normalize(csv, SourceKind::Generic).unwrap();
        assert_eq!(txs[0].description, "ACME, INC");
        assert_eq!(txs[0].amount, money("1200.00"));
    }

    #[test]
    fn memo_concatenation_is_stable() {
        let csv = "Date,Description,Amount,Memo\n\
                   2025-01-15,CHECK 1042,-300.00,contractor invoice\n";
        let a = normalize(csv, SourceKind::Generic).unwrap();
        let b = normalize(csv, SourceKind::Generic).unwrap();
        assert_eq!(a[0].description, "CHECK 1042 | contractor invoice");
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn missing_columns_lists_found_and_expected() {
        let csv = "Datum,Betrag\n2025-01-15,-5.00\n";
        let err = normalize(csv, SourceKind::Generic).unwrap_err();
        match err {
            FormatError::MissingColumns { expected, found } => {
                assert_eq!(expected, vec!["date", "description", "amount"]);
                assert_eq!(found, vec!["Datum".to_string(), "Betrag".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_a_format_error() {
        assert!(matches!(
            normalize("   \n  ", SourceKind::Generic),
            Err(FormatError::EmptyInput)
        ));
    }

    #[test]
    fn header_only_input_is_an_empty_import() {
        let txs = normalize("Date,Description,Amount\n", SourceKind::Generic).unwrap();
        assert!(txs.is_empty());
    }

    // ── card-statement adapter ────────────────────────────────────────────────

    #[test]
    fn card_forces_sale_negative_and_return_positive() {
        let csv = "Posting Date,Payee,Amount,Type\n\
                   01/15/2025,COFFEE BAR,4.50,Sale\n\
                   01/16/2025,COFFEE BAR,-4.50,Return\n\
                   01/17/2025,PAYMENT THANK YOU,-120.00,Payment\n";
        let txs = normalize(csv, SourceKind::CardStatement).unwrap();
        assert_eq!(txs[0].amount, money("-4.50"));
        assert_eq!(txs[1].amount, money("4.50"));
        assert_eq!(txs[2].amount, money("120.00"));
    }

    #[test]
    fn card_leaves_unknown_types_alone() {
        let csv = "Date,Description,Amount,Type\n\
                   2025-01-15,ANNUAL FEE,-95.00,Fee\n";
        let txs = normalize(csv, SourceKind::CardStatement).unwrap();
        assert_eq!(txs[0].amount, money("-95.00"));
    }

    #[test]
    fn card_requires_a_type_column() {
        let csv = "Date,Description,Amount\n2025-01-15,X,-1.00\n";
        assert!(matches!(
            normalize(csv, SourceKind::CardStatement),
            Err(FormatError::MissingColumns { .. })
        ));
    }

    // ── debit/credit adapter ──────────────────────────────────────────────────

    #[test]
    fn debit_credit_computes_credit_minus_debit() {
        let csv = "Date,Description,Debit,Credit\n\
                   2025-01-15,CLIENT PAYMENT,,1500.00\n\
                   2025-01-16,OFFICE RENT,900.00,\n";
        let txs = normalize(csv, SourceKind::DebitCredit).unwrap();
        assert_eq!(txs[0].amount, money("1500.00"));
        assert_eq!(txs[1].amount, money("-900.00"));
    }

    #[test]
    fn debit_credit_drops_zero_and_pending_rows() {
        let csv = "Date,Description,Debit,Credit,Status\n\
                   2025-01-15,VOID,,,Posted\n\
                   2025-01-16,HOLD,25.00,,Pending\n\
                   2025-01-17,KEPT,10.00,,Posted\n";
        let txs = normalize(csv, SourceKind::DebitCredit).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "KEPT");
    }

    // ── modes and determinism ─────────────────────────────────────────────────

    #[test]
    fn validating_mode_collects_row_errors_with_positions() {
        let csv = "Date,Description,Amount\n\
                   2025-01-15,GOOD,-1.00\n\
                   junk,BAD DATE,-2.00\n\
                   2025-01-17,,-3.00\n\
                   2025-01-18,BAD AMOUNT,abc\n";
        let import = normalize_validating(csv, SourceKind::Generic).unwrap();
        assert_eq!(import.transactions.len(), 1);
        assert_eq!(import.row_errors.len(), 3);
        assert_eq!(import.row_errors[0].row, 1);
        assert_eq!(
            import.row_errors[0].kind,
            RowErrorKind::InvalidDate("junk".to_string())
        );
        assert_eq!(import.row_errors[1].kind, RowErrorKind::EmptyDescription);
        assert_eq!(
            import.row_errors[2].kind,
            RowErrorKind::InvalidAmount("abc".to_string())
        );
    }

    #[test]
    fn best_effort_mode_skips_malformed_rows() {
        let csv = "Date,Description,Amount\n\
                   2025-01-15,GOOD,-1.00\n\
                   junk,BAD,-2.00\n";
        let txs = normalize(csv, SourceKind::Generic).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "GOOD");
    }

    #[test]
    fn reparsing_identical_input_yields_identical_ids() {
        let csv = "Date,Description,Amount\n\
                   2025-01-15,STRIPE PAYOUT,2500.00\n\
                   2025-01-15,STRIPE PAYOUT,2500.00\n";
        let a = normalize(csv, SourceKind::Generic).unwrap();
        let b = normalize(csv, SourceKind::Generic).unwrap();
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[1].id, b[1].id);
        // Same fields, different row index: still unique.
        assert_ne!(a[0].id, a[1].id);
    }

    #[test]
    fn source_kind_round_trips_through_key() {
        for kind in [
            SourceKind::Generic,
            SourceKind::CardStatement,
            SourceKind::DebitCredit,
        ] {
            assert_eq!(SourceKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(SourceKind::from_key("ofx"), None);
    }
}
