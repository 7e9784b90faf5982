//! PDF text extraction.
//!
//! Two backends behind one trait: the in-process `pdf-extract` crate, and an
//! external command such as `pdftotext -layout`. Neither enforces a deadline;
//! callers wrap `extract` in a timeout, and dropping the future kills a running
//! child process and removes its staged temp file.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use spendlens_core::StatementError;
use tokio::process::Command;

use crate::types::ExtractedDocument;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Zero-byte and non-PDF uploads are rejected before any extractor runs.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    // some generators put a few bytes of junk before the header
    bytes
        .windows(PDF_MAGIC.len())
        .take(1024)
        .any(|w| w == PDF_MAGIC)
}

pub fn ensure_pdf(bytes: &[u8]) -> Result<(), StatementError> {
    if bytes.is_empty() {
        return Err(StatementError::ExtractionFailure("empty upload".into()));
    }
    if !looks_like_pdf(bytes) {
        return Err(StatementError::ExtractionFailure(
            "missing %PDF- header".into(),
        ));
    }
    Ok(())
}

/// Turns PDF bytes into page text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError>;

    fn name(&self) -> &'static str;
}

fn finish(pages: Vec<String>) -> Result<ExtractedDocument, StatementError> {
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(StatementError::ExtractionFailure(
            "no extractable text (scanned PDF?)".into(),
        ));
    }
    Ok(ExtractedDocument::new(pages))
}

/// In-process extraction with the `pdf-extract` crate.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError> {
        ensure_pdf(pdf)?;
        let bytes = pdf.to_vec();
        let password = password.map(str::to_owned);

        // pdf-extract is CPU-bound and can panic on malformed input; a panic surfaces as a JoinError
        let result = tokio::task::spawn_blocking(move || match password {
            Some(pw) => pdf_extract::extract_text_from_mem_by_pages_encrypted(&bytes, pw.as_str()),
            None => pdf_extract::extract_text_from_mem_by_pages(&bytes),
        })
        .await;

        match result {
            Ok(Ok(pages)) => finish(pages),
            Ok(Err(e)) => Err(StatementError::ExtractionFailure(e.to_string())),
            Err(join) if join.is_panic() => Err(StatementError::ExtractionFailure(
                "PDF library panicked on this document".into(),
            )),
            Err(join) => Err(StatementError::ExtractionFailure(join.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

/// Extraction through an external tool that prints page text to stdout.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Flag that precedes the password, e.g. `-upw` for pdftotext.
    pub password_flag: Option<String>,
}

impl CommandExtractor {
    pub fn pdftotext() -> Self {
        Self {
            program: PathBuf::from("pdftotext"),
            args: vec!["-layout".to_string()],
            password_flag: Some("-upw".to_string()),
        }
    }

    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            password_flag: None,
        }
    }

    pub fn with_password_flag(mut self, flag: Option<String>) -> Self {
        self.password_flag = flag;
        self
    }
}

/// Form feed separates pages in pdftotext output; the final one is trailing.
fn split_pages(stdout: &str) -> Vec<String> {
    let mut pages: Vec<String> = stdout.split('\x0c').map(str::to_owned).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract(
        &self,
        pdf: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, StatementError> {
        ensure_pdf(pdf)?;

        // removed when dropped, on every path out of this function
        let mut staged = tempfile::Builder::new()
            .prefix("spendlens-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| StatementError::ExtractionFailure(format!("staging upload: {e}")))?;
        staged
            .write_all(pdf)
            .and_then(|_| staged.flush())
            .map_err(|e| StatementError::ExtractionFailure(format!("staging upload: {e}")))?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let (Some(flag), Some(pw)) = (&self.password_flag, password) {
            cmd.arg(flag).arg(pw);
        }
        cmd.arg(staged.path()).arg("-").kill_on_drop(true);

        tracing::debug!(program = %self.program.display(), "spawning extractor");
        let output = cmd.output().await.map_err(|e| {
            StatementError::ProcessSpawnFailure(format!("{}: {e}", self.program.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                program = %self.program.display(),
                status = %output.status,
                stderr = %stderr.trim(),
                "extractor exited with failure"
            );
            return Err(StatementError::ExtractionFailure(format!(
                "extractor exited with {}",
                output.status
            )));
        }

        finish(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendlens_core::ErrorKind;

    #[test]
    fn test_pdf_magic() {
        assert!(looks_like_pdf(b"%PDF-1.7\n..."));
        assert!(!looks_like_pdf(b""));
        assert!(!looks_like_pdf(b"PK\x03\x04 zip archive"));
    }

    #[test]
    fn test_split_pages() {
        assert_eq!(split_pages("one\x0ctwo\x0c"), vec!["one", "two"]);
        assert_eq!(split_pages("single"), vec!["single"]);
    }

    #[tokio::test]
    async fn test_builtin_rejects_non_pdf() {
        let err = PdfTextExtractor.extract(b"", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        let err = PdfTextExtractor
            .extract(b"hello, not a pdf", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    }

    #[tokio::test]
    async fn test_garbage_after_header_is_extraction_failure() {
        let err = PdfTextExtractor
            .extract(b"%PDF-1.4\nthis is not really a pdf", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    }

    #[tokio::test]
    async fn test_missing_command_is_spawn_failure() {
        let extractor = CommandExtractor::new("/nonexistent/spendlens-extractor", vec![]);
        let err = extractor.extract(b"%PDF-1.4\n", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcessSpawnFailure);
        assert!(err.is_retryable());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_split_into_pages() {
        // `sh -c <script> <arg0> <pdf> -` prints two form-feed separated pages
        let extractor = CommandExtractor::new(
            "sh",
            vec!["-c".into(), "printf 'page one\\fpage two\\f'".into(), "sh".into()],
        );
        let doc = extractor.extract(b"%PDF-1.4\n", None).await.unwrap();
        assert_eq!(doc.pages, vec!["page one", "page two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_hides_stderr() {
        let extractor = CommandExtractor::new(
            "sh",
            vec!["-c".into(), "echo 'Syntax Error: secret detail' >&2; exit 3".into(), "sh".into()],
        );
        let err = extractor.extract(b"%PDF-1.4\n", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
        assert!(!err.user_message().contains("secret"));
    }
}
