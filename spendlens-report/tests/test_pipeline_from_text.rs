use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use spendlens_core::{Classifier, ErrorKind, StatementError};
use spendlens_ingest::{ExtractedDocument, StatementKind, TextExtractor};
use spendlens_report::{AnalyzeRequest, Analyzer, StatementReport};

const PDF_STUB: &[u8] = b"%PDF-1.4\n% test stub\n";

/// Returns canned page text instead of reading the PDF.
struct CannedExtractor {
    pages: Vec<String>,
    calls: AtomicUsize,
}

impl CannedExtractor {
    fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextExtractor for CannedExtractor {
    async fn extract(
        &self,
        _pdf: &[u8],
        _password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExtractedDocument::new(self.pages.clone()))
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

/// Never finishes within any reasonable deadline.
struct StuckExtractor;

#[async_trait]
impl TextExtractor for StuckExtractor {
    async fn extract(
        &self,
        _pdf: &[u8],
        _password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ExtractedDocument::default())
    }

    fn name(&self) -> &'static str {
        "stuck"
    }
}

fn analyzer(extractor: Arc<dyn TextExtractor>) -> Analyzer {
    Analyzer::new(extractor, Arc::new(Classifier::builtin().unwrap()))
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn request(kind: StatementKind) -> AnalyzeRequest {
    AnalyzeRequest {
        pdf: PDF_STUB.to_vec(),
        password: None,
        kind,
    }
}

const PHONEPE_PAGES: &[&str] = &[
    "\
PhonePe Transaction Statement
Date Transaction Details Type Amount
Nov 06, 2024 Paid to Swiggy DEBIT ₹250
10:15 am Transaction ID T1 UTR No. 1
Debited from XX1234
Nov 07, 2024 Salary from ACME CREDIT ₹40,000
Credited to XX1234
Page 1 of 2",
    "\
Nov 08, 2024 Self transfer to HDFC DEBIT ₹5,000
Debited from XX1234
Nov 08, 2024 Received from XX1234 CREDIT ₹5,000
Credited to XX9876
Nov 09, 2024 Paid to Uber India DEBIT ₹180.50
Debited from XX9876
Page 2 of 2",
];

#[tokio::test]
async fn test_phonepe_end_to_end() {
    let report = analyzer(Arc::new(CannedExtractor::new(PHONEPE_PAGES)))
        .analyze(request(StatementKind::PhonePe))
        .await
        .unwrap();

    assert_eq!(report.page_count, 2);
    assert_eq!(report.transactions.len(), 5);
    // both legs of the transfer stay in the list but not in the totals
    assert_eq!(report.transactions.iter().filter(|t| t.self_transfer).count(), 2);
    assert_eq!(report.summary.total_transactions, 3);
    assert_eq!(report.summary.total_received, d("40000"));
    assert_eq!(report.summary.total_spent, d("430.5"));
    assert_eq!(report.summary.balance, d("39569.5"));

    let accounts = report.accounts.as_ref().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].account_number, "XX1234");
    assert_eq!(accounts[0].payments_made.count, 1);
    assert_eq!(accounts[0].payments_received.total, d("40000"));
    assert_eq!(accounts[1].payments_made.total, d("180.5"));

    let period = report.statement_period.as_ref().unwrap();
    assert_eq!(period.start_date, "2024-11-06");
    assert_eq!(period.end_date, "2024-11-09");
}

#[tokio::test]
async fn test_auto_detects_kotak() {
    let pages = ["\
Kotak Mahindra Bank
Account No. 9876543210
01-04-2024 UPI/ZOMATO/1 Food 350.00(Dr) 650.00(Cr)
02-04-2024 NEFT SALARY 25,000.00(Cr) 25,650.00(Cr)
"];
    let report = analyzer(Arc::new(CannedExtractor::new(&pages)))
        .analyze(request(StatementKind::Auto))
        .await
        .unwrap();
    assert_eq!(report.summary.total_spent, d("350"));
    let info = report.account_info.as_ref().unwrap();
    assert_eq!(info.account_number.as_deref(), Some("9876543210"));
    let accounts = report.accounts.as_ref().unwrap();
    assert_eq!(accounts[0].bank_logo.as_deref(), Some("kotak"));
}

#[tokio::test]
async fn test_wrong_bank_is_format_mismatch_not_empty_success() {
    let extractor = Arc::new(CannedExtractor::new(&["Some Other Bank\nNothing useful"]));
    let err = analyzer(extractor)
        .analyze(request(StatementKind::Kotak))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FormatMismatch);
}

#[tokio::test]
async fn test_empty_upload_never_calls_extractor() {
    let extractor = Arc::new(CannedExtractor::new(&["PhonePe"]));
    let err = analyzer(extractor.clone())
        .analyze(AnalyzeRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extraction_timeout() {
    let err = analyzer(Arc::new(StuckExtractor))
        .with_extraction_timeout(Duration::from_millis(50))
        .analyze(request(StatementKind::Auto))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionTimeout);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_json_round_trip_keeps_rows() {
    let report = analyzer(Arc::new(CannedExtractor::new(PHONEPE_PAGES)))
        .analyze(request(StatementKind::PhonePe))
        .await
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let back: StatementReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.transactions.len(), report.transactions.len());
    for (a, b) in back.transactions.iter().zip(&report.transactions) {
        assert_eq!(a.date, b.date);
        assert_eq!(a.amount, b.amount);
    }

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["transactions"][4]["amount"], -180.5);
    assert_eq!(value["pageCount"], 2);
}
