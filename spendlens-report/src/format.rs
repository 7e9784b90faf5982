//! Presentation settings handed to the assembler.
//!
//! Aggregates are exact; this is the only place where amounts and percentages
//! are rounded, and where dates get their wire shape.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendlens_core::{format_inr, round_money, to_iso_date};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `2024-01-02`
    #[default]
    Date,
    /// `2024-01-02T00:00:00`, for front ends that parse a timestamp
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportFormat {
    pub amount_dp: u32,
    pub percentage_dp: u32,
    pub date_style: DateStyle,
    /// Include `chartData` in reports.
    pub chart_data: bool,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            amount_dp: 2,
            percentage_dp: 1,
            date_style: DateStyle::Date,
            chart_data: true,
        }
    }
}

impl ReportFormat {
    pub fn amount(&self, value: Decimal) -> Decimal {
        round_money(value, self.amount_dp).normalize()
    }

    pub fn percentage(&self, value: Decimal) -> Decimal {
        round_money(value, self.percentage_dp).normalize()
    }

    pub fn date(&self, date: NaiveDate) -> String {
        match self.date_style {
            DateStyle::Date => to_iso_date(date),
            DateStyle::Timestamp => format!("{}T00:00:00", to_iso_date(date)),
        }
    }

    /// Human-readable rupee amount for terminal output.
    pub fn display_amount(&self, value: Decimal) -> String {
        format_inr(value, self.amount_dp)
    }
}
