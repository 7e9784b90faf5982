//! Statement aggregates: summary totals, category breakdown, per-account flows.
//!
//! Everything here is a fold over exact decimals, so any permutation of the same
//! transactions produces identical output. Self-transfers are skipped by every total.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{AccountRef, Category, StatementPeriod, Transaction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_received: Decimal,
    pub total_spent: Decimal,
    pub balance: Decimal,
    pub credit_count: usize,
    pub debit_count: usize,
    pub total_transactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    /// Sum of absolute amounts.
    pub amount: Decimal,
    pub count: usize,
    /// Share of all category amounts, 0..=100, unrounded.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flow {
    pub count: usize,
    pub total: Decimal,
}

impl Flow {
    fn add(&mut self, amount: Decimal) {
        self.count += 1;
        self.total += amount.abs();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub number: String,
    pub name: String,
    pub bank_logo: Option<String>,
    pub payments_made: Flow,
    pub payments_received: Flow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub summary: Summary,
    pub category_breakdown: BTreeMap<Category, CategoryTotals>,
    /// Sorted by account number; accounts without activity are left out.
    pub accounts: Vec<AccountSummary>,
    pub period: Option<StatementPeriod>,
}

pub fn aggregate(transactions: &[Transaction], own_accounts: &[AccountRef]) -> Aggregates {
    let mut summary = Summary::default();
    let mut breakdown: BTreeMap<Category, CategoryTotals> = BTreeMap::new();
    let mut flows: BTreeMap<String, (Flow, Flow)> = BTreeMap::new();

    for t in transactions.iter().filter(|t| !t.self_transfer) {
        if t.is_credit() {
            summary.total_received += t.abs_amount();
            summary.credit_count += 1;
        } else {
            summary.total_spent += t.abs_amount();
            summary.debit_count += 1;
        }

        let entry = breakdown.entry(t.category).or_default();
        entry.amount += t.abs_amount();
        entry.count += 1;

        if let Some(account) = &t.account {
            let (made, received) = flows.entry(account.clone()).or_default();
            if t.is_credit() {
                received.add(t.amount);
            } else {
                made.add(t.amount);
            }
        }
    }

    summary.balance = summary.total_received - summary.total_spent;
    summary.total_transactions = summary.credit_count + summary.debit_count;

    let grand_total: Decimal = breakdown.values().map(|c| c.amount).sum();
    if !grand_total.is_zero() {
        for totals in breakdown.values_mut() {
            totals.percentage = totals.amount / grand_total * Decimal::ONE_HUNDRED;
        }
    }

    let accounts = flows
        .into_iter()
        .map(|(number, (made, received))| {
            let known = own_accounts.iter().find(|a| a.number == number);
            AccountSummary {
                name: known
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| format!("Account {number}")),
                bank_logo: known.and_then(|a| a.bank_logo.clone()),
                number,
                payments_made: made,
                payments_received: received,
            }
        })
        .collect();

    Aggregates {
        summary,
        category_breakdown: breakdown,
        accounts,
        period: period(transactions),
    }
}

/// Earliest and latest date, regardless of row order.
pub fn period(transactions: &[Transaction]) -> Option<StatementPeriod> {
    let start_date = transactions.iter().map(|t| t.date).min()?;
    let end_date = transactions.iter().map(|t| t.date).max()?;
    Some(StatementPeriod {
        start_date,
        end_date,
    })
}
