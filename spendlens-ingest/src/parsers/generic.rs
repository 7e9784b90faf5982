//! Layout-agnostic parser for bank and wallet statements we have no adapter for.
//!
//! Any line starting with a day-first date opens a row. Money tokens are
//! either two-decimal figures (`1,234.56`) or currency-prefixed (`₹250`), each
//! optionally followed by a `Dr`/`Cr`/`DEBIT`/`CREDIT` marker. With two or more
//! tokens the last one is the running balance.

use regex::Regex;
use rust_decimal::Decimal;
use spendlens_core::{parse_amount, Direction, StatementError, StatementTransaction};

use crate::records::{
    balance_delta, clean_description, keep_amount, narration_hint, RecordGrouper,
};
use crate::types::{ExtractedDocument, ParsedStatement};

const CURRENCY_WORDS: &[&str] = &["₹", "Rs", "Rs.", "INR"];

struct MoneyToken {
    value: Decimal,
    marker: Option<Direction>,
}

struct WordPatterns {
    money: Regex,
    marker: Regex,
}

impl WordPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            money: Regex::new(concat!(
                r"(?i)^(?P<num>[-+]?(?:(?:₹|Rs\.?|INR)[\d,]*\d(?:\.\d{1,2})?|[\d,]*\d\.\d{2}))",
                r"(?:\((?P<m1>Dr|Cr)\)|(?P<m2>Dr|Cr))?$",
            ))?,
            marker: Regex::new(r"(?i)^\(?(?P<m>Dr|Cr|DEBIT|CREDIT)\)?$")?,
        })
    }

    fn money(&self, word: &str) -> Option<MoneyToken> {
        let caps = self.money.captures(word)?;
        let value = parse_amount(&caps["num"])?;
        let marker = caps
            .name("m1")
            .or_else(|| caps.name("m2"))
            .map(|m| marker(m.as_str()));
        Some(MoneyToken { value, marker })
    }

    fn marker(&self, word: &str) -> Option<Direction> {
        self.marker.captures(word).map(|c| marker(&c["m"]))
    }
}

fn marker(s: &str) -> Direction {
    match s.to_ascii_lowercase().as_str() {
        "cr" | "credit" => Direction::Credit,
        _ => Direction::Debit,
    }
}

/// Split a record into money tokens and the narration words around them.
fn tokenize<'a>(p: &WordPatterns, text: &'a str) -> (Vec<MoneyToken>, Vec<&'a str>) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut tokens = Vec::new();
    let mut narration = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        // "₹ 250" / "Rs. 1,000.00" split over two words
        let (candidate, mut used) = match words.get(i + 1) {
            Some(next) if CURRENCY_WORDS.contains(&word) => (format!("{word}{next}"), 2),
            _ => (word.to_string(), 1),
        };

        match p.money(&candidate) {
            Some(mut token) => {
                if token.marker.is_none() {
                    if let Some(m) = words.get(i + used).and_then(|w| p.marker(w)) {
                        token.marker = Some(m);
                        used += 1;
                    }
                }
                tokens.push(token);
                i += used;
            }
            None => {
                narration.push(word);
                i += 1;
            }
        }
    }
    (tokens, narration)
}

/// Parse any statement with date-anchored rows.
pub fn parse_generic_text(doc: &ExtractedDocument) -> Result<ParsedStatement, StatementError> {
    let grouper = RecordGrouper::new()?;
    let patterns = WordPatterns::new()?;

    let records = grouper.group(doc.lines());
    if records.is_empty() {
        return Err(StatementError::format_mismatch("bank"));
    }

    let mut previous_balance: Option<Decimal> = None;
    let mut out = Vec::new();

    for record in records {
        let text = record.text();
        let (tokens, narration) = tokenize(&patterns, &text);
        let (amount, balance) = match tokens.as_slice() {
            [] => {
                tracing::debug!(date = %record.date, text = %text, "generic: no amount in record");
                continue;
            }
            [only] => (only, None),
            [.., amount, balance] => (amount, Some(balance.value)),
        };

        let description = clean_description(&narration.join(" "));
        let direction = amount
            .marker
            .or_else(|| balance_delta(previous_balance, balance))
            .or_else(|| amount.value.is_sign_negative().then_some(Direction::Debit))
            .or_else(|| narration_hint(&description))
            .unwrap_or(Direction::Debit);
        if balance.is_some() {
            previous_balance = balance;
        }

        if !keep_amount(amount.value, record.date, &description) {
            continue;
        }
        out.push(
            StatementTransaction::new(record.date, description, amount.value, direction)
                .with_balance(balance),
        );
    }

    if out.is_empty() {
        return Err(StatementError::NoTransactionsFound);
    }

    Ok(ParsedStatement {
        transactions: out,
        accounts: Vec::new(),
        account_info: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use spendlens_core::ErrorKind;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(text: &str) -> Result<ParsedStatement, StatementError> {
        parse_generic_text(&ExtractedDocument::from_text(text))
    }

    #[test]
    fn test_marked_amounts() {
        let parsed = parse(
            "\
HDFC Bank Ltd
01/04/2024 UPI-ZOMATO-PAYMENT 450.00 Dr 9,550.00
02/04/2024 SALARY APR 75,000.00(Cr) 84,550.00
",
        )
        .unwrap();
        let t = &parsed.transactions;
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].amount, d("-450.00"));
        assert_eq!(t[0].description, "UPI-ZOMATO-PAYMENT");
        assert_eq!(t[0].balance, Some(d("9550.00")));
        assert_eq!(t[1].amount, d("75000.00"));
        assert_eq!(t[1].description, "SALARY APR");
        assert_eq!(t[1].date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
    }

    #[test]
    fn test_direction_from_balance_then_keywords() {
        let parsed = parse(
            "\
03 Apr 2024 Card purchase BigBasket 1,200.00
04 Apr 2024 NEFT 0042 300.00 5,300.00
05 Apr 2024 NEFT 0043 100.00 5,200.00
06 Apr 2024 NEFT 0044 50.00 5,250.00
",
        )
        .unwrap();
        let t = &parsed.transactions;
        // no balance: "purchase" hints debit
        assert_eq!(t[0].direction, Some(Direction::Debit));
        // no previous balance and no hint: debit
        assert_eq!(t[1].direction, Some(Direction::Debit));
        // balance fell, then rose
        assert_eq!(t[2].amount, d("-100.00"));
        assert_eq!(t[3].amount, d("50.00"));
        assert_eq!(t[3].description, "NEFT 0044");
    }

    #[test]
    fn test_currency_and_sign() {
        let parsed = parse("06-04-2024 Refund from Flipkart ₹ 1,499\n07-04-2024 Fee -25.00\n").unwrap();
        let t = &parsed.transactions;
        assert_eq!(t[0].direction, Some(Direction::Credit));
        assert_eq!(t[0].amount, d("1499"));
        assert_eq!(t[0].description, "Refund from Flipkart");
        assert_eq!(t[1].direction, Some(Direction::Debit));
        assert_eq!(t[1].amount, d("-25.00"));
    }

    #[test]
    fn test_no_dates_is_format_mismatch() {
        let err = parse("Dear customer,\nyour statement is attached.\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    }

    #[test]
    fn test_dates_without_amounts() {
        let err = parse("01-04-2024 Account opened\n").unwrap_err();
        assert_eq!(err, StatementError::NoTransactionsFound);
    }
}
