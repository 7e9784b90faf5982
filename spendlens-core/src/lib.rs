//! spendlens-core: ledger model, classifier and aggregates for Indian bank/UPI statements

pub mod aggregate;
pub mod categorizer;
pub mod dates;
pub mod error;
pub mod model;
pub mod money;
pub mod self_transfer;

pub use aggregate::{aggregate, AccountSummary, Aggregates, CategoryTotals, Flow, Summary};
pub use categorizer::{classify, default_rules, Classifier, Rule, RuleTable};
pub use dates::{parse_statement_date, to_iso_date};
pub use error::{ErrorKind, StatementError};
pub use model::{
    AccountInfo, AccountRef, Category, Direction, StatementPeriod, StatementTransaction,
    Transaction, PALETTE,
};
pub use money::{format_inr, parse_amount, round_money};
pub use self_transfer::is_self_transfer;
