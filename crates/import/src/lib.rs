pub mod columns;
pub mod normalize;

pub use columns::ColumnMap;
pub use normalize::{
    normalize, normalize_validating, transaction_id, FormatError, NormalizedImport, RowError,
    RowErrorKind, SourceKind, MEMO_SEPARATOR,
};
