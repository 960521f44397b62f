pub mod export;
pub mod fmt;
pub mod text;

pub use export::{export_csv, ExportError, ExportFilter, EXPORT_HEADERS};
pub use text::{render_alerts, render_summary};
