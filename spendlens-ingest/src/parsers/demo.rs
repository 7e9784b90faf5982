//! Sample ledger served for the `demo` platform, without reading the upload.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendlens_core::{Direction, StatementTransaction};

use crate::types::ParsedStatement;

const ROWS: &[(u32, &str, i64, Direction)] = &[
    (1, "Amazon order", 500, Direction::Debit),
    (2, "Salary credit", 1000, Direction::Credit),
    (3, "Swiggy dinner", 300, Direction::Debit),
];

pub fn demo_statement() -> ParsedStatement {
    let transactions = ROWS
        .iter()
        .filter_map(|(day, description, amount, direction)| {
            let date = NaiveDate::from_ymd_opt(2024, 3, *day)?;
            Some(StatementTransaction::new(
                date,
                *description,
                Decimal::from(*amount),
                *direction,
            ))
        })
        .collect();

    ParsedStatement {
        transactions,
        accounts: Vec::new(),
        account_info: None,
    }
}
