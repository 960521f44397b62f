use chrono::Datelike;
use thiserror::Error;

use apportion_core::CategorizedTransaction;

/// Fixed export columns. The last three stay empty for non-split rows.
pub const EXPORT_HEADERS: [&str; 9] = [
    "Date",
    "Description",
    "Amount",
    "Category",
    "Venture",
    "Note",
    "OriginalTxnId",
    "SplitPercent",
    "OriginalAmount",
];

/// Rows are kept only when every present filter matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportFilter {
    pub venture: Option<String>,
    /// Calendar year of the transaction date.
    pub year: Option<i32>,
}

impl ExportFilter {
    fn keeps(&self, tx: &CategorizedTransaction) -> bool {
        if let Some(venture) = &self.venture {
            if tx.venture != *venture {
                return false;
            }
        }
        if let Some(year) = self.year {
            if tx.date.year() != year {
                return false;
            }
        }
        true
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serialize categorized output as delimited text. Fields containing the
/// delimiter, a quote, or a newline are quoted with embedded quotes
/// doubled (the writer's default quoting).
pub fn export_csv(
    categorized: &[CategorizedTransaction],
    filter: &ExportFilter,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for tx in categorized.iter().filter(|tx| filter.keeps(tx)) {
        let (original_id, percent, original_amount) = match (&tx.original_txn_id, &tx.allocation) {
            (Some(id), Some(alloc)) => (
                id.clone(),
                alloc.percent.to_string(),
                alloc.original_amount.to_string(),
            ),
            _ => (String::new(), String::new(), String::new()),
        };
        writer.write_record([
            tx.date.to_string(),
            tx.description.clone(),
            tx.amount.to_string(),
            tx.category.clone(),
            tx.venture.clone(),
            tx.note.clone(),
            original_id,
            percent,
            original_amount,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
