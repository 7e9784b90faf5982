//! PhonePe transaction statement parser (text)
//!
//! Expected extracted-text layout:
//!   Date            Transaction Details                 Type     Amount
//!   Nov 06, 2024    Paid to Swiggy                      DEBIT    ₹250
//!   10:15 am        Transaction ID T2411061015123456
//!                   UTR No. 431112345678
//!                   Debited from XX1234
//!
//! The `Debited from` / `Credited to` line names the linked bank account; one
//! statement can cover several.

use regex::Regex;
use spendlens_core::{parse_amount, AccountRef, Direction, StatementError, StatementTransaction};

use crate::records::{clean_description, collapse, keep_amount, RecordGrouper};
use crate::types::{ExtractedDocument, ParsedStatement};

struct RowPatterns {
    row: Regex,
    account: Regex,
    tail_noise: Regex,
}

impl RowPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            row: Regex::new(
                r"(?i)^(?P<body>.*?)\s*\b(?P<dir>DEBIT|CREDIT)\s+(?P<amt>(?:₹|Rs\.?|INR)\s*[\d,]+(?:\.\d{1,2})?)(?P<tail>.*)$",
            )?,
            account: Regex::new(r"(?i)\b(?:Debited\s+from|Credited\s+to)\s+(?P<acct>[A-Za-z]*\d{2,})")?,
            tail_noise: Regex::new(concat!(
                r"(?i)\b\d{1,2}:\d{2}\s*(?:am|pm)?\b",
                r"|\bTransaction\s+ID\s*:?\s*\S+",
                r"|\bUTR\s+No\.?\s*:?\s*\S+",
                r"|\b(?:Debited\s+from|Credited\s+to)\s+[A-Za-z]*\d{2,}",
            ))?,
        })
    }
}

/// Parse a PhonePe statement. Fails with `FormatMismatch` when the document is not from PhonePe.
pub fn parse_phonepe_text(doc: &ExtractedDocument) -> Result<ParsedStatement, StatementError> {
    let grouper = RecordGrouper::new()?;
    if !grouper.preamble(doc).contains("phonepe") {
        return Err(StatementError::format_mismatch("PhonePe"));
    }

    let patterns = RowPatterns::new()?;

    let mut out = Vec::new();
    let mut accounts: Vec<AccountRef> = Vec::new();

    for record in grouper.group(doc.lines()) {
        let joined = record.text();
        let Some(caps) = patterns.row.captures(&joined) else {
            tracing::debug!(date = %record.date, text = %joined, "phonepe: unmatched record");
            continue;
        };

        let Some(amount) = parse_amount(&caps["amt"]) else {
            continue;
        };
        let direction = if caps["dir"].eq_ignore_ascii_case("credit") {
            Direction::Credit
        } else {
            Direction::Debit
        };

        let tail = &caps["tail"];
        let account = patterns
            .account
            .captures(tail)
            .map(|c| c["acct"].to_uppercase());
        if let Some(id) = &account {
            if !accounts.iter().any(|a| &a.number == id) {
                accounts.push(AccountRef::new(id.clone(), format!("Bank account {id}")));
            }
        }

        // wrapped merchant names land after the amount; keep them, drop the reference lines
        let leftover = collapse(&patterns.tail_noise.replace_all(tail, " "));
        let description = clean_description(&format!("{} {}", &caps["body"], leftover));

        if !keep_amount(amount, record.date, &description) {
            continue;
        }
        out.push(
            StatementTransaction::new(record.date, description, amount, direction)
                .with_account(account),
        );
    }

    if out.is_empty() {
        return Err(StatementError::NoTransactionsFound);
    }

    Ok(ParsedStatement {
        transactions: out,
        accounts,
        account_info: None,
    })
}
