//! One statement, start to finish: extract, parse, classify, aggregate, assemble.
//!
//! Each call owns its input and output; an `Analyzer` only holds read-only
//! collaborators, so one instance can serve concurrent requests. No retries
//! happen here; that policy belongs to whoever calls `analyze`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use spendlens_core::{aggregate, Classifier, StatementError, StatementTransaction, Transaction};
use spendlens_ingest::{
    ensure_pdf, parse_statement, ExtractedDocument, ParsedStatement, StatementKind, TextExtractor,
};
use tracing::{debug, info, warn};

use crate::assemble::{assemble, ReportInput, StatementReport};
use crate::format::ReportFormat;

pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracting,
    Parsing,
    Classifying,
    Aggregating,
    Assembled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Received => "received",
            Stage::Extracting => "extracting",
            Stage::Parsing => "parsing",
            Stage::Classifying => "classifying",
            Stage::Aggregating => "aggregating",
            Stage::Assembled => "assembled",
        };
        f.write_str(s)
    }
}

/// An uploaded statement.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub pdf: Vec<u8>,
    pub password: Option<String>,
    pub kind: StatementKind,
}

/// Tracks the current stage and logs transitions and failures.
struct Progress {
    stage: Stage,
}

impl Progress {
    fn new() -> Self {
        debug!(stage = %Stage::Received, "statement received");
        Self {
            stage: Stage::Received,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    fn fail(&self, err: StatementError) -> StatementError {
        match &err {
            StatementError::MalformedOutput(detail) => {
                warn!(stage = %self.stage, kind = %err.kind(), detail = %detail, "analysis failed")
            }
            _ => info!(stage = %self.stage, kind = %err.kind(), error = %err, "analysis failed"),
        }
        err
    }
}

pub struct Analyzer {
    extractor: Arc<dyn TextExtractor>,
    classifier: Arc<Classifier>,
    format: ReportFormat,
    extraction_timeout: Duration,
}

impl Analyzer {
    pub fn new(extractor: Arc<dyn TextExtractor>, classifier: Arc<Classifier>) -> Self {
        Self {
            extractor,
            classifier,
            format: ReportFormat::default(),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn format(&self) -> &ReportFormat {
        &self.format
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Analyze an uploaded PDF.
    pub async fn analyze(&self, req: AnalyzeRequest) -> Result<StatementReport, StatementError> {
        let mut progress = Progress::new();

        if req.kind == StatementKind::Demo {
            progress.advance(Stage::Parsing);
            let parsed = parse_statement(&ExtractedDocument::default(), StatementKind::Demo)
                .map_err(|e| progress.fail(e))?;
            return self.finish(parsed, 0, &mut progress);
        }

        progress.advance(Stage::Extracting);
        let doc = self
            .extract(&req.pdf, req.password.as_deref())
            .await
            .map_err(|e| progress.fail(e))?;
        info!(
            extractor = self.extractor.name(),
            pages = doc.page_count(),
            "text extracted"
        );

        progress.advance(Stage::Parsing);
        let parsed = parse_statement(&doc, req.kind).map_err(|e| progress.fail(e))?;
        self.finish(parsed, doc.page_count(), &mut progress)
    }

    /// Analyze text that was already extracted.
    pub fn analyze_document(
        &self,
        doc: &ExtractedDocument,
        kind: StatementKind,
    ) -> Result<StatementReport, StatementError> {
        let mut progress = Progress::new();
        progress.advance(Stage::Parsing);
        let parsed = parse_statement(doc, kind).map_err(|e| progress.fail(e))?;
        let pages = if kind == StatementKind::Demo { 0 } else { doc.page_count() };
        self.finish(parsed, pages, &mut progress)
    }

    /// Classify and aggregate a ready-made ledger.
    pub fn analyze_ledger(
        &self,
        ledger: Vec<StatementTransaction>,
    ) -> Result<StatementReport, StatementError> {
        let mut progress = Progress::new();
        let parsed = ParsedStatement {
            transactions: ledger,
            ..ParsedStatement::default()
        };
        self.finish(parsed, 0, &mut progress)
    }

    async fn extract(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError> {
        ensure_pdf(pdf)?;
        // on expiry the extraction future is dropped, which kills a command extractor's child
        match tokio::time::timeout(self.extraction_timeout, self.extractor.extract(pdf, password))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(StatementError::ExtractionTimeout(self.extraction_timeout)),
        }
    }

    fn finish(
        &self,
        parsed: ParsedStatement,
        page_count: usize,
        progress: &mut Progress,
    ) -> Result<StatementReport, StatementError> {
        if parsed.transactions.is_empty() {
            return Err(progress.fail(StatementError::NoTransactionsFound));
        }

        progress.advance(Stage::Classifying);
        let transactions = self
            .classifier
            .classify_all(&parsed.transactions, &parsed.accounts);
        validate(&transactions).map_err(|e| progress.fail(e))?;

        progress.advance(Stage::Aggregating);
        let aggregates = aggregate(&transactions, &parsed.accounts);

        let report = assemble(
            ReportInput {
                transactions: &transactions,
                aggregates: &aggregates,
                account_info: parsed.account_info.as_ref(),
                page_count,
            },
            &self.format,
        );
        progress.advance(Stage::Assembled);
        info!(
            transactions = report.transactions.len(),
            counted = report.summary.total_transactions,
            "statement analyzed"
        );
        Ok(report)
    }
}

/// Reject rows that would break the report contract.
pub fn validate(transactions: &[Transaction]) -> Result<(), StatementError> {
    for (i, t) in transactions.iter().enumerate() {
        if t.description.trim().is_empty() {
            return Err(StatementError::MalformedOutput(format!(
                "row {i}: empty description"
            )));
        }
        if t.amount.is_zero() {
            return Err(StatementError::MalformedOutput(format!("row {i}: zero amount")));
        }
        if t.amount.is_sign_negative() != t.is_debit() {
            return Err(StatementError::MalformedOutput(format!(
                "row {i}: amount {} disagrees with type {}",
                t.amount,
                t.direction.as_str()
            )));
        }
    }
    Ok(())
}
