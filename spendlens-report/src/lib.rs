//! spendlens-report: report assembly, formatting, CSV export and the per-statement pipeline

pub mod assemble;
pub mod export;
pub mod format;
pub mod pipeline;

pub use assemble::{assemble, ErrorBody, ReportInput, StatementReport};
pub use export::write_transactions_csv;
pub use format::{DateStyle, ReportFormat};
pub use pipeline::{AnalyzeRequest, Analyzer, Stage};
