//! CSV export of a report's transaction list.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::assemble::StatementReport;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: &'a str,
    description: &'a str,
    amount: String,
    #[serde(rename = "type")]
    direction: &'a str,
    category: &'a str,
    self_transfer: bool,
    account: &'a str,
}

/// Columns: date,description,amount,type,category,self_transfer,account
pub fn write_transactions_csv(report: &StatementReport, out: impl Write) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for t in &report.transactions {
        wtr.serialize(CsvRow {
            date: &t.date,
            description: &t.description,
            amount: t.amount.to_string(),
            direction: t.direction.as_str(),
            category: t.category.label(),
            self_transfer: t.self_transfer,
            account: t.account.as_deref().unwrap_or(""),
        })
        .with_context(|| format!("writing row for {}", t.date))?;
    }
    wtr.flush().context("flushing CSV output")?;
    Ok(())
}
