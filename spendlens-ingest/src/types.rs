use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spendlens_core::{AccountInfo, AccountRef, StatementTransaction};

/// Which parser adapter handles a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// Detect from the extracted text.
    #[default]
    Auto,
    Kotak,
    PhonePe,
    Generic,
    /// Fixed sample ledger, no extraction.
    Demo,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Auto => "auto",
            StatementKind::Kotak => "kotak",
            StatementKind::PhonePe => "phonepe",
            StatementKind::Generic => "generic",
            StatementKind::Demo => "demo",
        }
    }

    /// Name used in "This does not appear to be a ... statement".
    pub fn display_name(&self) -> &'static str {
        match self {
            StatementKind::Auto | StatementKind::Generic => "bank",
            StatementKind::Kotak => "Kotak Bank",
            StatementKind::PhonePe => "PhonePe",
            StatementKind::Demo => "demo",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(StatementKind::Auto),
            "kotak" | "kotak-bank" | "kotak_bank" => Ok(StatementKind::Kotak),
            "phonepe" | "phone-pe" => Ok(StatementKind::PhonePe),
            "generic" | "bank" | "other" => Ok(StatementKind::Generic),
            "demo" | "mock" => Ok(StatementKind::Demo),
            other => Err(format!("unknown statement kind: {other}")),
        }
    }
}

/// Page texts produced by a text extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Single-page document from plain text (tests, `.txt` input).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![text.into()],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined by newlines, in order.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.lines())
    }
}

/// Output of a parser adapter. Rows are in the statement's own order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStatement {
    pub transactions: Vec<StatementTransaction>,
    /// Own accounts named by the statement.
    pub accounts: Vec<AccountRef>,
    pub account_info: Option<AccountInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Kotak".parse::<StatementKind>().unwrap(), StatementKind::Kotak);
        assert_eq!("phonepe".parse::<StatementKind>().unwrap(), StatementKind::PhonePe);
        assert_eq!("".parse::<StatementKind>().unwrap(), StatementKind::Auto);
        assert!("hdfc-credit".parse::<StatementKind>().is_err());
    }

    #[test]
    fn test_document_lines_span_pages() {
        let doc = ExtractedDocument::new(vec!["a\nb".into(), "c".into()]);
        assert_eq!(doc.lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(doc.page_count(), 2);
    }
}
