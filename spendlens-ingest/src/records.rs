//! Line grouping shared by the statement parsers.
//!
//! Extracted PDF text wraps narrations across lines and interleaves page
//! headers/footers with rows. A date at the start of a line opens a record;
//! following lines are continuation text until the next date. Page noise is
//! skipped without closing the record; end-of-table markers close it.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use spendlens_core::{parse_statement_date, Direction};

use crate::types::ExtractedDocument;

pub const UNKNOWN_DESCRIPTION: &str = "Unknown transaction";

const STOP_MARKERS: &[&str] = &[
    "statement summary",
    "end of statement",
    "end of transaction",
    "summary of transactions",
];

const NOISE_MARKERS: &[&str] = &[
    "opening balance",
    "closing balance",
    "brought forward",
    "carried forward",
    "system generated",
    "computer generated",
    "does not require signature",
];

const HEADER_COLUMNS: &[&str] = &[
    "narration",
    "description",
    "particulars",
    "transaction details",
];

/// One logical transaction: the anchor line's date plus all of its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub date: NaiveDate,
    /// Anchor line after the date.
    pub head: String,
    pub continuation: Vec<String>,
}

impl Record {
    /// Head and continuation on one line, whitespace collapsed.
    pub fn text(&self) -> String {
        let mut parts = vec![self.head.as_str()];
        parts.extend(self.continuation.iter().map(|s| s.as_str()));
        collapse(&parts.join(" "))
    }
}

pub struct RecordGrouper {
    date_re: Regex,
    page_re: Regex,
}

impl RecordGrouper {
    pub fn new() -> Result<Self, regex::Error> {
        let date_re = Regex::new(concat!(
            r"^\s*(?P<date>",
            r"\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4}",
            r"|\d{4}-\d{2}-\d{2}",
            r"|\d{1,2}[- ][A-Za-z]{3,9}[- ]\d{2,4}",
            r"|\d{1,2} [A-Za-z]{3,9}, ?\d{4}",
            r"|[A-Za-z]{3,9} \d{1,2} ?,? ?\d{4}",
            r")\b"
        ))?;
        let page_re =
            Regex::new(r"(?i)^\s*page\s+\d+(?:\s*(?:of|/)\s*\d+)?\s*$|\bpage\s+\d+\s+of\s+\d+\b")?;
        Ok(Self { date_re, page_re })
    }

    /// Date at the very start of a line, and the rest of the line.
    pub fn date_prefix<'a>(&self, line: &'a str) -> Option<(NaiveDate, &'a str)> {
        let caps = self.date_re.captures(line)?;
        let m = caps.name("date")?;
        let date = parse_statement_date(m.as_str())?;
        Some((date, line[m.end()..].trim()))
    }

    pub fn is_noise(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        if self.page_re.is_match(line) {
            return true;
        }
        if NOISE_MARKERS.iter().any(|m| lower.contains(m)) {
            return true;
        }
        // column header row
        lower.contains("date") && HEADER_COLUMNS.iter().any(|c| lower.contains(c))
    }

    pub fn is_stop(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        STOP_MARKERS.iter().any(|m| lower.contains(m))
    }

    /// First-page text above the first dated row, lowercased. This is where a
    /// statement names its issuer; narrations further down may name other banks.
    /// A first page without dated rows is returned whole.
    pub fn preamble(&self, doc: &ExtractedDocument) -> String {
        let Some(first) = doc.pages.first() else {
            return String::new();
        };
        first
            .lines()
            .take_while(|line| self.date_prefix(line.trim()).is_none())
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase()
    }

    pub fn group<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> Vec<Record> {
        let mut records = Vec::new();
        let mut current: Option<Record> = None;

        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.is_stop(trimmed) {
                records.extend(current.take());
                continue;
            }
            if self.is_noise(trimmed) {
                continue;
            }
            if let Some((date, rest)) = self.date_prefix(trimmed) {
                records.extend(current.take());
                current = Some(Record {
                    date,
                    head: rest.to_string(),
                    continuation: Vec::new(),
                });
                continue;
            }
            // text before the first anchor (or after a stop marker) is not part of any row
            if let Some(record) = current.as_mut() {
                record.continuation.push(trimmed.to_string());
            }
        }
        records.extend(current);
        records
    }
}

pub fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace and strip separator debris; empty becomes the placeholder.
pub fn clean_description(raw: &str) -> String {
    let cleaned = collapse(raw);
    let cleaned = cleaned.trim_matches(|c: char| c == '-' || c == '|' || c == ',' || c.is_whitespace());
    if cleaned.is_empty() {
        UNKNOWN_DESCRIPTION.to_string()
    } else {
        cleaned.to_string()
    }
}

const DEBIT_HINTS: &[&str] = &["paid", "debit", "withdraw", "purchase", "sent", "dr "];
const CREDIT_HINTS: &[&str] = &["received", "credit", "refund", "salary", "deposit", "cr "];

/// Last-resort direction from narration wording. `None` when nothing hints either way.
pub fn narration_hint(description: &str) -> Option<Direction> {
    let lower = format!("{} ", description.to_lowercase());
    if CREDIT_HINTS.iter().any(|h| lower.contains(h)) {
        return Some(Direction::Credit);
    }
    if DEBIT_HINTS.iter().any(|h| lower.contains(h)) {
        return Some(Direction::Debit);
    }
    None
}

/// Direction from a running balance moving between two rows.
pub fn balance_delta(previous: Option<Decimal>, current: Option<Decimal>) -> Option<Direction> {
    match (previous, current) {
        (Some(prev), Some(cur)) if cur > prev => Some(Direction::Credit),
        (Some(prev), Some(cur)) if cur < prev => Some(Direction::Debit),
        _ => None,
    }
}

/// Zero-amount rows carry no money movement and are dropped.
pub fn keep_amount(amount: Decimal, date: NaiveDate, description: &str) -> bool {
    if amount.is_zero() {
        tracing::debug!(%date, description, "dropping zero-amount row");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouper() -> RecordGrouper {
        RecordGrouper::new().unwrap()
    }

    #[test]
    fn test_wrapped_narration_rejoined() {
        let text = "\
Date Narration Amount
01-04-2024 UPI/SWIGGY/409112 250.00(Dr)
  FOOD ORDER BANGALORE
02-04-2024 Salary APR 50,000.00(Cr)
";
        let records = grouper().group(text.lines());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text(), "UPI/SWIGGY/409112 250.00(Dr) FOOD ORDER BANGALORE");
        assert_eq!(records[1].date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
    }

    #[test]
    fn test_page_break_does_not_split_record() {
        let text = "\
Nov 06, 2024 Paid to Swiggy DEBIT ₹250
Page 1 of 2
This is a system generated statement.
Date Transaction Details Type Amount
10:15 am Transaction ID T2411
Nov 07, 2024 Received from Rahul CREDIT ₹500
";
        let records = grouper().group(text.lines());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].continuation, vec!["10:15 am Transaction ID T2411"]);
    }

    #[test]
    fn test_stop_marker_closes_record() {
        let text = "\
01/04/2024 ATM withdrawal 2,000.00
Statement Summary
Total debits 2,000.00
";
        let records = grouper().group(text.lines());
        assert_eq!(records.len(), 1);
        assert!(records[0].continuation.is_empty());
    }

    #[test]
    fn test_preamble_ignored_and_order_kept() {
        let text = "\
Account Statement
05-04-2024 B 1.00
01-04-2024 A 1.00
";
        let records = grouper().group(text.lines());
        let heads: Vec<_> = records.iter().map(|r| r.head.as_str()).collect();
        assert_eq!(heads, vec!["B 1.00", "A 1.00"]);
    }

    #[test]
    fn test_issuer_preamble_stops_at_first_row() {
        let doc = ExtractedDocument {
            pages: vec![
                "PhonePe\nTransaction Statement\nNov 06, 2024 Paid to Kotak Credit Card DEBIT ₹4,000".into(),
                "Kotak Mahindra Bank".into(),
            ],
        };
        assert_eq!(grouper().preamble(&doc), "phonepe\ntransaction statement");

        let undated = ExtractedDocument::from_text("Kotak Mahindra Bank\nNothing here");
        assert_eq!(grouper().preamble(&undated), "kotak mahindra bank\nnothing here");
        assert_eq!(grouper().preamble(&ExtractedDocument { pages: vec![] }), "");
    }

    #[test]
    fn test_narration_hint() {
        assert_eq!(narration_hint("Refund from Flipkart"), Some(Direction::Credit));
        assert_eq!(narration_hint("POS purchase"), Some(Direction::Debit));
        assert_eq!(narration_hint("NEFT 0042"), None);
    }

    #[test]
    fn test_balance_delta() {
        let prev = Some(Decimal::from(1000));
        assert_eq!(balance_delta(prev, Some(Decimal::from(750))), Some(Direction::Debit));
        assert_eq!(balance_delta(prev, Some(Decimal::from(1200))), Some(Direction::Credit));
        assert_eq!(balance_delta(None, Some(Decimal::from(1200))), None);
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(clean_description("  -  "), UNKNOWN_DESCRIPTION);
        assert_eq!(clean_description(" Paid   to  X - "), "Paid to X");
    }
}
