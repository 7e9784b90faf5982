//! Kotak Mahindra Bank savings statement parser (text)
//!
//! Expected extracted-text layout:
//!   Account Number : 1234567890     Account Type : Savings
//!   Date        Narration                       Chq/Ref No     Withdrawal (Dr)/Deposit (Cr)   Balance
//!   01-04-2024  UPI/SWIGGY/409112345/Food       UPI-409112345  250.00(Dr)                     9,750.00(Cr)
//!
//! Older exports print separate withdrawal/deposit columns with `-` for the
//! empty side, and some print only `amount balance`; for those the direction
//! comes from the running balance.

use regex::Regex;
use rust_decimal::Decimal;
use spendlens_core::{
    parse_amount, AccountInfo, AccountRef, Direction, StatementError, StatementTransaction,
};

use crate::records::{
    balance_delta, clean_description, keep_amount, narration_hint, RecordGrouper,
};
use crate::types::{ExtractedDocument, ParsedStatement};

const BANK_LOGO: &str = "kotak";
const MAX_DESCRIPTION: usize = 100;

struct RowPatterns {
    marked: Regex,
    columns: Regex,
    amount_balance: Regex,
    marked_only: Regex,
    noise: Regex,
}

impl RowPatterns {
    fn new() -> Result<Self, regex::Error> {
        const AMT: &str = r"[\d,]*\d\.\d{2}";
        Ok(Self {
            // NARRATION [REF] 250.00(Dr) 9,750.00(Cr)
            marked: Regex::new(&format!(
                r"(?i)^(?P<narr>.*?)(?:^|\s)(?P<amt>{AMT})\s*\((?P<dc>Dr|Cr)\)\s*(?P<bal>-?{AMT})(?:\s*\((?:Dr|Cr)\))?(?P<rest>.*)$"
            ))?,
            // NARRATION 250.00 - 9,750.00
            columns: Regex::new(&format!(
                r"(?i)^(?P<narr>.*?)(?:^|\s)(?P<wd>{AMT}|-)\s+(?P<dep>{AMT}|-)\s+(?P<bal>-?{AMT})(?:\s*\((?:Dr|Cr)\))?(?P<rest>.*)$"
            ))?,
            // NARRATION 250.00 9,750.00
            amount_balance: Regex::new(&format!(
                r"(?i)^(?P<narr>.*?)(?:^|\s)(?P<amt>{AMT})\s+(?P<bal>-?{AMT})(?:\s*\((?:Dr|Cr)\))?(?P<rest>.*)$"
            ))?,
            // NARRATION 250.00(Dr)
            marked_only: Regex::new(&format!(
                r"(?i)^(?P<narr>.*?)(?:^|\s)(?P<amt>{AMT})\s*\((?P<dc>Dr|Cr)\)(?P<rest>.*)$"
            ))?,
            noise: Regex::new(r"(?i)\b(?:transaction id|ref no|reference|remarks)\s*:.*$")?,
        })
    }
}

/// A row before its direction is settled.
struct RawRow {
    narration: String,
    amount: Decimal,
    direction: Option<Direction>,
    balance: Option<Decimal>,
}

fn marker(s: &str) -> Direction {
    if s.eq_ignore_ascii_case("dr") {
        Direction::Debit
    } else {
        Direction::Credit
    }
}

fn join_narration(narr: &str, rest: &str) -> String {
    format!("{} {}", narr.trim(), rest.trim())
}

fn match_row(p: &RowPatterns, text: &str) -> Option<RawRow> {
    if let Some(c) = p.marked.captures(text) {
        return Some(RawRow {
            narration: join_narration(&c["narr"], &c["rest"]),
            amount: parse_amount(&c["amt"])?,
            direction: Some(marker(&c["dc"])),
            balance: parse_amount(&c["bal"]),
        });
    }

    if let Some(c) = p.columns.captures(text) {
        let withdrawal = parse_amount(&c["wd"]);
        let deposit = parse_amount(&c["dep"]);
        let side = match (withdrawal, deposit) {
            (Some(w), None) => Some((w, Direction::Debit)),
            (None, Some(d)) => Some((d, Direction::Credit)),
            _ => None,
        };
        if let Some((amount, direction)) = side {
            return Some(RawRow {
                narration: join_narration(&c["narr"], &c["rest"]),
                amount,
                direction: Some(direction),
                balance: parse_amount(&c["bal"]),
            });
        }
    }

    if let Some(c) = p.amount_balance.captures(text) {
        return Some(RawRow {
            narration: join_narration(&c["narr"], &c["rest"]),
            amount: parse_amount(&c["amt"])?,
            direction: None,
            balance: parse_amount(&c["bal"]),
        });
    }

    let c = p.marked_only.captures(text)?;
    Some(RawRow {
        narration: join_narration(&c["narr"], &c["rest"]),
        amount: parse_amount(&c["amt"])?,
        direction: Some(marker(&c["dc"])),
        balance: None,
    })
}

fn clean_narration(p: &RowPatterns, raw: &str) -> String {
    let stripped = p.noise.replace(raw, "");
    let mut description = clean_description(&stripped);
    if description.chars().count() > MAX_DESCRIPTION {
        description = description.chars().take(MAX_DESCRIPTION - 3).collect::<String>() + "...";
    }
    description
}

fn header_field(text: &str, pattern: &str) -> Result<Option<String>, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty()))
}

pub fn parse_account_info(text: &str) -> Result<AccountInfo, regex::Error> {
    Ok(AccountInfo {
        account_number: header_field(text, r"(?i)Account\s*(?:Number|No\.?)\s*:?\s*(\d{6,})")?,
        account_name: header_field(text, r"(?im)Account\s*Name\s*:\s*(.+?)\s*(?:\s{2,}|$)")?,
        account_type: header_field(text, r"(?im)Account\s*Type\s*:\s*(.+?)\s*(?:\s{2,}|$)")?,
        branch: header_field(text, r"(?im)\bBranch(?:\s*Name)?\s*:\s*(.+?)\s*(?:\s{2,}|$)")?,
    })
}

fn opening_balance(doc: &ExtractedDocument) -> Option<Decimal> {
    let line = doc
        .lines()
        .find(|l| l.to_lowercase().contains("opening balance"))?;
    line.split_whitespace()
        .rev()
        .find_map(|tok| parse_amount(tok.trim_end_matches("(Cr)").trim_end_matches("(Dr)")))
}

/// Parse a Kotak statement. Fails with `FormatMismatch` when the document is not from Kotak.
pub fn parse_kotak_text(doc: &ExtractedDocument) -> Result<ParsedStatement, StatementError> {
    let grouper = RecordGrouper::new()?;
    if !grouper.preamble(doc).contains(BANK_LOGO) {
        return Err(StatementError::format_mismatch("Kotak Bank"));
    }

    let text = doc.text();
    let patterns = RowPatterns::new()?;
    let info = parse_account_info(&text)?;
    let account_number = info.account_number.clone();

    let mut previous_balance = opening_balance(doc);
    let mut out = Vec::new();

    for record in grouper.group(doc.lines()) {
        let Some(row) = match_row(&patterns, &record.text()) else {
            tracing::debug!(date = %record.date, text = %record.text(), "kotak: unmatched record");
            continue;
        };

        let direction = row
            .direction
            .or_else(|| balance_delta(previous_balance, row.balance))
            .or_else(|| narration_hint(&row.narration))
            .unwrap_or(Direction::Debit);
        if row.balance.is_some() {
            previous_balance = row.balance;
        }

        let description = clean_narration(&patterns, &row.narration);
        if !keep_amount(row.amount, record.date, &description) {
            continue;
        }
        out.push(
            StatementTransaction::new(record.date, description, row.amount, direction)
                .with_balance(row.balance)
                .with_account(account_number.clone()),
        );
    }

    if out.is_empty() {
        return Err(StatementError::NoTransactionsFound);
    }

    let accounts = match &account_number {
        Some(number) => vec![AccountRef::new(
            number.clone(),
            info.account_name.clone().unwrap_or_else(|| "Kotak Account".to_string()),
        )
        .with_logo(BANK_LOGO)],
        None => Vec::new(),
    };

    Ok(ParsedStatement {
        transactions: out,
        accounts,
        account_info: (!info.is_empty()).then_some(info),
    })
}
