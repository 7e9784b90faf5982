//! Rule-based transaction classifier.
//!
//! An ordered table of `keywords -> category` rules. Each rule compiles to one
//! case-insensitive, word-bounded regex; the first rule that matches wins, so a
//! "Zomato refund" is Income (refund rules come first) and never Food.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{AccountRef, Category, Direction, StatementTransaction, Transaction};
use crate::self_transfer::is_self_transfer;

/// One classification rule as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl Rule {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Built-in rules, in priority order.
const DEFAULT_RULES: &[(Category, &[&str])] = &[
    (
        Category::Income,
        &[
            "salary", "sal cr", "payroll", "stipend", "interest earned", "interest credit",
            "int.pd", "dividend", "cashback", "cash back", "refund", "reversal",
        ],
    ),
    (
        Category::FoodAndDining,
        &[
            "zomato", "swiggy", "dominos", "domino's", "pizza", "restaurant", "cafe", "kfc",
            "mcdonald", "mcdonalds", "starbucks", "burger", "eatsure", "blinkit", "zepto",
            "bigbasket", "dunzo", "bakery", "food", "dining", "dinner", "lunch",
        ],
    ),
    // Subscriptions that would otherwise fall into Shopping via "amazon".
    (Category::Entertainment, &["amazon prime", "prime video"]),
    (
        Category::Shopping,
        &[
            "amazon", "flipkart", "myntra", "ajio", "meesho", "nykaa", "tata cliq", "croma",
            "reliance digital", "decathlon", "ikea", "dmart", "d-mart", "shoppers stop",
            "lifestyle", "mall", "store", "mart", "retail", "shopping",
        ],
    ),
    (
        Category::Transport,
        &[
            "uber", "ola", "rapido", "irctc", "redbus", "metro", "indigo", "air india",
            "vistara", "spicejet", "makemytrip", "goibibo", "fuel", "petrol", "diesel", "hpcl",
            "bpcl", "indian oil", "iocl", "fastag", "parking", "cab", "taxi", "railway",
        ],
    ),
    (
        Category::BillsAndUtilities,
        &[
            "electricity", "bescom", "msedcl", "tata power", "water bill", "gas", "broadband",
            "airtel", "jio", "vodafone", "bsnl", "act fibernet", "recharge", "dth", "tata sky",
            "postpaid", "prepaid", "bill", "utility", "rent", "maintenance",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "netflix", "hotstar", "disney", "spotify", "youtube", "bookmyshow", "pvr", "inox",
            "gaana", "wynk", "sonyliv", "zee5", "jiocinema", "steam", "playstation", "movie",
            "cinema",
        ],
    ),
    (
        Category::Health,
        &[
            "apollo", "pharmacy", "pharmeasy", "1mg", "netmeds", "medplus", "hospital",
            "clinic", "doctor", "diagnostic", "diagnostics", "practo", "cult.fit", "gym",
            "medical",
        ],
    ),
    (
        Category::Education,
        &[
            "school", "college", "university", "tuition", "udemy", "coursera", "byju", "byjus",
            "unacademy", "upgrad", "course", "exam fee", "books",
        ],
    ),
    (
        Category::Finance,
        &[
            "emi", "loan", "insurance", "lic", "premium", "mutual fund", "sip", "zerodha",
            "groww", "upstox", "credit card", "cc payment", "bank charges", "charges", "gst",
            "tax", "interest",
        ],
    ),
    (
        Category::Transfer,
        &[
            "upi", "imps", "neft", "rtgs", "transfer", "trf", "sent to", "paid to",
            "received from", "fund transfer", "atm", "atm wdl", "cash withdrawal", "cash wdl",
        ],
    ),
];

#[derive(Debug, Clone)]
struct CompiledRule {
    category: Category,
    pattern: Regex,
}

/// Compiled, read-only rule table. Build once and share.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    pub fn new(rules: &[Rule]) -> Result<Self, regex::Error> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let alternatives: Vec<String> = rule
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(regex::escape)
                .collect();
            if alternatives.is_empty() {
                continue;
            }
            let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?;
            compiled.push(CompiledRule {
                category: rule.category,
                pattern,
            });
        }
        Ok(Self { rules: compiled })
    }

    pub fn builtin() -> Result<Self, regex::Error> {
        Self::new(&default_rules())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching rule's category, or `Others`.
    pub fn classify(&self, description: &str) -> Category {
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(description))
            .map(|r| r.category)
            .unwrap_or(Category::Others)
    }
}

/// The built-in rules as editable values (used by `config init`).
pub fn default_rules() -> Vec<Rule> {
    DEFAULT_RULES
        .iter()
        .map(|(category, keywords)| Rule::new(*category, keywords))
        .collect()
}

static DEFAULT_TABLE: LazyLock<Option<RuleTable>> = LazyLock::new(|| RuleTable::builtin().ok());

/// Classify with the built-in table. Pure and total: unknown text is `Others`.
pub fn classify(description: &str) -> Category {
    DEFAULT_TABLE
        .as_ref()
        .map(|t| t.classify(description))
        .unwrap_or(Category::Others)
}

/// Turns raw parser rows into classified transactions.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: RuleTable,
}

impl Classifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn builtin() -> Result<Self, regex::Error> {
        Ok(Self::new(RuleTable::builtin()?))
    }

    /// User rules are checked before the built-in ones.
    pub fn with_overrides(overrides: &[Rule]) -> Result<Self, regex::Error> {
        let mut rules = overrides.to_vec();
        rules.extend(default_rules());
        Ok(Self::new(RuleTable::new(&rules)?))
    }

    pub fn classify(&self, description: &str) -> Category {
        self.table.classify(description)
    }

    /// Resolve direction, normalize the sign and attach category and self-transfer flag.
    pub fn apply(&self, raw: &StatementTransaction, own_accounts: &[AccountRef]) -> Transaction {
        let direction: Direction = raw.resolved_direction();
        Transaction {
            date: raw.date,
            description: raw.description.clone(),
            amount: direction.signed(raw.amount),
            direction,
            category: self.table.classify(&raw.description),
            self_transfer: is_self_transfer(&raw.description, raw.account.as_deref(), own_accounts),
            account: raw.account.clone(),
            balance: raw.balance,
        }
    }

    pub fn classify_all(
        &self,
        raw: &[StatementTransaction],
        own_accounts: &[AccountRef],
    ) -> Vec<Transaction> {
        raw.iter().map(|t| self.apply(t, own_accounts)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_builtin_examples() {
        assert_eq!(classify("Zomato order"), Category::FoodAndDining);
        assert_eq!(classify("Salary credit"), Category::Income);
        assert_eq!(classify("UPI/Uber India/okaxis"), Category::Transport);
        assert_eq!(classify("NETFLIX.COM subscription"), Category::Entertainment);
        assert_eq!(classify("Apollo Pharmacy"), Category::Health);
        assert_eq!(classify("Paid to Rahul Sharma"), Category::Transfer);
        assert_eq!(classify("Random merchant 42"), Category::Others);
        assert_eq!(classify(""), Category::Others);
    }

    #[test]
    fn test_first_match_wins() {
        // refund (Income) is listed before zomato (Food)
        assert_eq!(classify("Zomato refund"), Category::Income);
        // "amazon prime" special precedes the Shopping "amazon" rule
        assert_eq!(classify("AMAZON PRIME membership"), Category::Entertainment);
        assert_eq!(classify("Amazon order"), Category::Shopping);
    }

    #[test]
    fn test_word_boundaries() {
        // "ola" must not fire inside "Coca Cola"; "gas" not inside "Vegas"
        assert_eq!(classify("Coca Cola bottler"), Category::Others);
        assert_eq!(classify("Vegas trip"), Category::Others);
    }

    #[test]
    fn test_cash_withdrawals_are_transfers() {
        assert_eq!(classify("ATM WDL MG ROAD BLR"), Category::Transfer);
        assert_eq!(classify("NWD/ATM/S1CN1234"), Category::Transfer);
        assert_eq!(classify("Cash withdrawal at branch"), Category::Transfer);
        // not inside words
        assert_eq!(classify("Batman comics"), Category::Others);
    }

    #[test]
    fn test_deterministic() {
        let a = classify("Swiggy Instamart");
        for _ in 0..10 {
            assert_eq!(classify("Swiggy Instamart"), a);
        }
    }

    #[test]
    fn test_overrides_take_priority() {
        let rules = vec![Rule::new(Category::Education, &["swiggy"])];
        let c = Classifier::with_overrides(&rules).unwrap();
        assert_eq!(c.classify("Swiggy"), Category::Education);
        // built-ins still apply underneath
        assert_eq!(c.classify("Uber ride"), Category::Transport);
    }

    #[test]
    fn test_keywords_are_literal() {
        let rules = vec![Rule::new(Category::Finance, &["x.y"])];
        let table = RuleTable::new(&rules).unwrap();
        assert_eq!(table.classify("paid x.y ltd"), Category::Finance);
        assert_eq!(table.classify("paid xzy ltd"), Category::Others);
    }

    #[test]
    fn test_apply_normalizes_sign() {
        let c = Classifier::builtin().unwrap();
        let raw = StatementTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "Zomato order",
            d("100"),
            Direction::Debit,
        );
        let mut positive = raw.clone();
        positive.amount = d("100");
        let t = c.apply(&positive, &[]);
        assert_eq!(t.amount, d("-100"));
        assert_eq!(t.direction, Direction::Debit);
        assert_eq!(t.category, Category::FoodAndDining);
        assert!(!t.self_transfer);
    }
}
