//! spendlens-ingest: PDF text extraction and bank/UPI statement parsers.

pub mod extract;
pub mod parsers;
pub mod records;
pub mod types;

pub use extract::{ensure_pdf, looks_like_pdf, CommandExtractor, PdfTextExtractor, TextExtractor};
pub use parsers::{detect_kind, parse_statement, resolve_kind};
pub use types::{ExtractedDocument, ParsedStatement, StatementKind};
