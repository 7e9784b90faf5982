//! Ledger types shared by the parser, classifier, aggregator and assembler.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money in or out of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "credit", alias = "CREDIT", alias = "Cr", alias = "CR", alias = "cr")]
    Credit,
    #[serde(rename = "debit", alias = "DEBIT", alias = "Dr", alias = "DR", alias = "dr")]
    Debit,
}

impl Direction {
    /// Direction implied by a signed amount: negative is a debit, anything else a credit.
    pub fn from_sign(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }

    /// Re-sign a magnitude: credits positive, debits negative.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            Direction::Credit => amount.abs(),
            Direction::Debit => -amount.abs(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" | "cr" => Ok(Direction::Credit),
            "debit" | "dr" => Ok(Direction::Debit),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Fixed spending categories. The UI assigns chart colours from this set, so it never grows
/// per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Dining", alias = "food", alias = "dining")]
    FoodAndDining,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Transport", alias = "travel")]
    Transport,
    #[serde(rename = "Bills & Utilities", alias = "bills", alias = "utilities")]
    BillsAndUtilities,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Health")]
    Health,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Finance")]
    Finance,
    #[serde(rename = "Transfer")]
    Transfer,
    #[serde(rename = "Income")]
    Income,
    #[serde(rename = "Others", alias = "other", alias = "misc")]
    Others,
}

/// Chart palette shared with the front end.
pub const PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#C9CBCF", "#8BC34A",
    "#E91E63", "#00BCD4",
];

impl Category {
    pub const ALL: [Category; 11] = [
        Category::FoodAndDining,
        Category::Shopping,
        Category::Transport,
        Category::BillsAndUtilities,
        Category::Entertainment,
        Category::Health,
        Category::Education,
        Category::Finance,
        Category::Transfer,
        Category::Income,
        Category::Others,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Shopping => "Shopping",
            Category::Transport => "Transport",
            Category::BillsAndUtilities => "Bills & Utilities",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Finance => "Finance",
            Category::Transfer => "Transfer",
            Category::Income => "Income",
            Category::Others => "Others",
        }
    }

    /// Deterministic chart colour.
    pub fn color(&self) -> &'static str {
        let idx = Category::ALL.iter().position(|c| c == self).unwrap_or(0);
        PALETTE[idx % PALETTE.len()]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the label (case-insensitive) and the same short aliases serde takes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        if let Some(c) = Category::ALL.iter().find(|c| c.label().to_lowercase() == wanted) {
            return Ok(*c);
        }
        match wanted.as_str() {
            "food" | "dining" => Ok(Category::FoodAndDining),
            "bills" | "utilities" => Ok(Category::BillsAndUtilities),
            "travel" => Ok(Category::Transport),
            "other" | "misc" => Ok(Category::Others),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// One row as read from a statement, before classification.
///
/// `amount` is whatever the source reported; `direction` (JSON `type`) wins over the sign
/// when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub balance: Option<Decimal>,
    /// Own-account identifier this row belongs to, when the statement says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl StatementTransaction {
    /// Row with an explicit direction; `magnitude` is re-signed to match it.
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        magnitude: Decimal,
        direction: Direction,
    ) -> Self {
        Self {
            date,
            description: description.into(),
            amount: direction.signed(magnitude),
            direction: Some(direction),
            balance: None,
            account: None,
        }
    }

    pub fn with_balance(mut self, balance: Option<Decimal>) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.account = account;
        self
    }

    /// Direction from `type` if present, else from the sign.
    pub fn resolved_direction(&self) -> Direction {
        self.direction
            .unwrap_or_else(|| Direction::from_sign(self.amount))
    }
}

/// A classified ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Credit positive, debit negative.
    pub amount: Decimal,
    pub direction: Direction,
    pub category: Category,
    /// Excluded from every total when set.
    pub self_transfer: bool,
    pub account: Option<String>,
    pub balance: Option<Decimal>,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn abs_amount(&self) -> Decimal {
        self.amount.abs()
    }
}

/// An own account referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_logo: Option<String>,
}

impl AccountRef {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            bank_logo: None,
        }
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.bank_logo = Some(logo.into());
        self
    }
}

/// Account-holder metadata printed in a statement header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl AccountInfo {
    pub fn is_empty(&self) -> bool {
        self.account_number.is_none()
            && self.account_name.is_none()
            && self.account_type.is_none()
            && self.branch.is_none()
    }
}

/// First and last posting date covered by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_direction_wins_over_sign() {
        let t = StatementTransaction::new(date(), "Zomato order", d("100"), Direction::Debit);
        assert_eq!(t.amount, d("-100"));
        assert_eq!(t.resolved_direction(), Direction::Debit);
    }

    #[test]
    fn test_direction_from_sign_when_untyped() {
        let json = r#"{"date":"2024-01-02","description":"Refund","amount":-20.5}"#;
        let t: StatementTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.direction, None);
        assert_eq!(t.resolved_direction(), Direction::Debit);
    }

    #[test]
    fn test_type_aliases_deserialize() {
        let json = r#"{"date":"2024-01-02","description":"x","amount":5,"type":"CREDIT"}"#;
        let t: StatementTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.direction, Some(Direction::Credit));
    }

    #[test]
    fn test_category_labels_round_trip() {
        for c in Category::ALL {
            assert_eq!(c.label().parse::<Category>().unwrap(), c);
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.label()));
        }
        assert_eq!("food".parse::<Category>().unwrap(), Category::FoodAndDining);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_short_aliases_deserialize() {
        let cats: Vec<Category> = serde_json::from_str(r#"["food", "bills", "travel", "misc", "Health"]"#).unwrap();
        assert_eq!(
            cats,
            vec![
                Category::FoodAndDining,
                Category::BillsAndUtilities,
                Category::Transport,
                Category::Others,
                Category::Health,
            ]
        );
        // aliases are accepted on input only
        assert_eq!(serde_json::to_string(&cats[0]).unwrap(), "\"Food & Dining\"");
    }

    #[test]
    fn test_category_colors_are_stable() {
        assert_eq!(Category::FoodAndDining.color(), PALETTE[0]);
        // 11 labels over a 10-colour palette wrap around
        assert_eq!(Category::Others.color(), PALETTE[0]);
    }
}
