pub mod demo;
pub mod generic;
pub mod kotak;
pub mod phonepe;

use spendlens_core::StatementError;

use crate::records::RecordGrouper;
use crate::types::{ExtractedDocument, ParsedStatement, StatementKind};

/// Pick an adapter from a statement's preamble (see `RecordGrouper::preamble`).
/// PhonePe is checked first: its statements routinely name the linked bank.
pub fn detect_kind(preamble: &str) -> StatementKind {
    let lower = preamble.to_lowercase();
    if lower.contains("phonepe") {
        StatementKind::PhonePe
    } else if lower.contains("kotak") {
        StatementKind::Kotak
    } else {
        StatementKind::Generic
    }
}

/// Resolve `Auto` against the document; other kinds pass through.
pub fn resolve_kind(
    doc: &ExtractedDocument,
    kind: StatementKind,
) -> Result<StatementKind, StatementError> {
    match kind {
        StatementKind::Auto => Ok(detect_kind(&RecordGrouper::new()?.preamble(doc))),
        other => Ok(other),
    }
}

/// Run the adapter for `kind` over extracted text.
pub fn parse_statement(
    doc: &ExtractedDocument,
    kind: StatementKind,
) -> Result<ParsedStatement, StatementError> {
    let resolved = resolve_kind(doc, kind)?;
    tracing::debug!(requested = %kind, resolved = %resolved, pages = doc.page_count(), "parsing statement");
    match resolved {
        StatementKind::Kotak => kotak::parse_kotak_text(doc),
        StatementKind::PhonePe => phonepe::parse_phonepe_text(doc),
        StatementKind::Generic | StatementKind::Auto => generic::parse_generic_text(doc),
        StatementKind::Demo => Ok(demo::demo_statement()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind("KOTAK MAHINDRA BANK LTD"), StatementKind::Kotak);
        assert_eq!(detect_kind("PhonePe transaction statement"), StatementKind::PhonePe);
        assert_eq!(detect_kind("State Bank of India"), StatementKind::Generic);
    }

    #[test]
    fn test_auto_routes_to_adapter() {
        let doc = ExtractedDocument::from_text(
            "PhonePe\nNov 06, 2024 Paid to Swiggy DEBIT ₹250\nDebited from XX1234\n",
        );
        let parsed = parse_statement(&doc, StatementKind::Auto).unwrap();
        assert_eq!(parsed.accounts.len(), 1);
    }

    #[test]
    fn test_phonepe_row_naming_kotak_stays_phonepe() {
        let doc = ExtractedDocument::from_text(
            "\
PhonePe Transaction Statement
Nov 06, 2024 Paid to Swiggy DEBIT ₹250
Debited from XX1234
Nov 07, 2024 Paid to Kotak Mahindra Bank Credit Card DEBIT ₹4,000
Debited from XX1234
",
        );
        assert_eq!(
            resolve_kind(&doc, StatementKind::Auto).unwrap(),
            StatementKind::PhonePe
        );
        let parsed = parse_statement(&doc, StatementKind::Auto).unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(
            parsed.transactions[1].description,
            "Paid to Kotak Mahindra Bank Credit Card"
        );
    }

    #[test]
    fn test_bank_row_naming_kotak_stays_generic() {
        let doc = ExtractedDocument::from_text(
            "\
HDFC Bank Ltd
01/04/2024 UPI-ZOMATO-PAYMENT 450.00 Dr 29,550.00
02/04/2024 NEFT TO KOTAK MAHINDRA RENT 20,000.00 Dr 9,550.00
",
        );
        assert_eq!(
            resolve_kind(&doc, StatementKind::Auto).unwrap(),
            StatementKind::Generic
        );
        let parsed = parse_statement(&doc, StatementKind::Auto).unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        // and the Kotak adapter refuses it outright
        assert_eq!(
            parse_statement(&doc, StatementKind::Kotak).unwrap_err(),
            StatementError::format_mismatch("Kotak Bank")
        );
    }

    #[test]
    fn test_explicit_kind_is_enforced() {
        let doc = ExtractedDocument::from_text("01-04-2024 Coffee 120.00 Dr 880.00\n");
        let err = parse_statement(&doc, StatementKind::Kotak).unwrap_err();
        assert_eq!(err, StatementError::format_mismatch("Kotak Bank"));
        assert!(parse_statement(&doc, StatementKind::Auto).is_ok());
    }
}
