//! Wire-format report assembled from classified transactions and their aggregates.
//!
//! Field names follow what the browser front end reads: camelCase for most keys,
//! with `account_info` and `statement_period` kept snake_case.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendlens_core::{
    AccountInfo, AccountSummary, Aggregates, Category, Direction, Flow, StatementError,
    Transaction,
};

use crate::format::ReportFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTransaction {
    pub date: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: Category,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub self_transfer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_received: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub credit_count: usize,
    pub debit_count: usize,
    pub total_transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFlow {
    pub count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAccount {
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_logo: Option<String>,
    pub account_number: String,
    pub payments_made: ReportFlow,
    pub payments_received: ReportFlow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

/// Pie-chart payload: one label and colour per category in the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub data: ChartSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementReport {
    pub transactions: Vec<ReportTransaction>,
    pub summary: ReportSummary,
    pub category_breakdown: BTreeMap<Category, BreakdownEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<ReportAccount>>,
    #[serde(rename = "account_info", default, skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,
    #[serde(rename = "statement_period", default, skip_serializing_if = "Option::is_none")]
    pub statement_period: Option<ReportPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_data: Option<ChartData>,
    /// Pages in the source PDF; 0 when unknown.
    #[serde(default)]
    pub page_count: usize,
}

/// Failure body. Never carries partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

impl From<&StatementError> for ErrorBody {
    fn from(err: &StatementError) -> Self {
        Self {
            error: err.user_message(),
            details: Some(err.kind().as_str().to_string()),
        }
    }
}

/// Everything the assembler reads for one statement.
pub struct ReportInput<'a> {
    pub transactions: &'a [Transaction],
    pub aggregates: &'a Aggregates,
    pub account_info: Option<&'a AccountInfo>,
    pub page_count: usize,
}

fn flow(format: &ReportFormat, f: &Flow) -> ReportFlow {
    ReportFlow {
        count: f.count,
        total: format.amount(f.total),
    }
}

fn account(format: &ReportFormat, a: &AccountSummary) -> ReportAccount {
    ReportAccount {
        account_name: a.name.clone(),
        bank_logo: a.bank_logo.clone(),
        account_number: a.number.clone(),
        payments_made: flow(format, &a.payments_made),
        payments_received: flow(format, &a.payments_received),
    }
}

pub fn assemble(input: ReportInput<'_>, format: &ReportFormat) -> StatementReport {
    let aggregates = input.aggregates;

    let transactions = input
        .transactions
        .iter()
        .map(|t| ReportTransaction {
            date: format.date(t.date),
            description: t.description.clone(),
            amount: format.amount(t.amount),
            category: t.category,
            direction: t.direction,
            self_transfer: t.self_transfer,
            account: t.account.clone(),
        })
        .collect();

    let s = &aggregates.summary;
    let summary = ReportSummary {
        total_received: format.amount(s.total_received),
        total_spent: format.amount(s.total_spent),
        // derived from the exact totals, then rounded once
        balance: format.amount(s.balance),
        credit_count: s.credit_count,
        debit_count: s.debit_count,
        total_transactions: s.total_transactions,
    };

    let category_breakdown: BTreeMap<Category, BreakdownEntry> = aggregates
        .category_breakdown
        .iter()
        .map(|(category, totals)| {
            (
                *category,
                BreakdownEntry {
                    amount: format.amount(totals.amount),
                    percentage: format.percentage(totals.percentage),
                    count: totals.count,
                },
            )
        })
        .collect();

    let chart_data = (format.chart_data && !category_breakdown.is_empty()).then(|| ChartData {
        data: ChartSeries {
            labels: category_breakdown.keys().map(|c| c.label().to_string()).collect(),
            datasets: vec![ChartDataset {
                data: category_breakdown
                    .values()
                    .map(|e| e.amount.to_f64().unwrap_or_default())
                    .collect(),
                background_color: category_breakdown
                    .keys()
                    .map(|c| c.color().to_string())
                    .collect(),
            }],
        },
    });

    let accounts = (!aggregates.accounts.is_empty())
        .then(|| aggregates.accounts.iter().map(|a| account(format, a)).collect());

    StatementReport {
        transactions,
        summary,
        category_breakdown,
        accounts,
        account_info: input.account_info.filter(|i| !i.is_empty()).cloned(),
        statement_period: aggregates.period.map(|p| ReportPeriod {
            start_date: format.date(p.start_date),
            end_date: format.date(p.end_date),
        }),
        chart_data,
        page_count: input.page_count,
    }
}
