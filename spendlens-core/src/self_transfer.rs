//! Detection of transfers between the user's own accounts.
//!
//! A row is a self-transfer when its narration carries an explicit marker
//! ("self transfer", "to self", "own a/c", ...) or, on a statement covering two or
//! more own accounts, names one of the *other* own accounts by full number or by
//! masked `XX1234` form.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::AccountRef;

/// Word-bounded so merchants like "Selfie Studio" or "Selfridges" never match.
static SELF_MARKERS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:self[- ]?transfer",
        r"|(?:to|from)\s+self",
        r"|own\s+(?:account|a/c))\b",
    ))
    .ok()
});

fn last4(number: &str) -> Option<String> {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    Some(digits[digits.len() - 4..].iter().collect())
}

fn mention_pattern(account: &AccountRef) -> Option<String> {
    let number = account.number.trim().to_lowercase();
    let masked = last4(&number).map(|tail| format!("x{{2,}}{tail}"));
    let full = (number.len() >= 6 && !number.starts_with("xx")).then(|| regex::escape(&number));
    let alternatives: Vec<String> = full.into_iter().chain(masked).collect();
    (!alternatives.is_empty()).then(|| format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
}

/// Full number or masked `XX1234`, as a whole word.
fn mentions(description: &str, account: &AccountRef) -> bool {
    mention_pattern(account)
        .and_then(|p| Regex::new(&p).ok())
        .is_some_and(|re| re.is_match(description))
}

pub fn is_self_transfer(
    description: &str,
    row_account: Option<&str>,
    own_accounts: &[AccountRef],
) -> bool {
    if SELF_MARKERS
        .as_ref()
        .is_some_and(|re| re.is_match(description))
    {
        return true;
    }
    if own_accounts.len() < 2 {
        return false;
    }

    let row_tail = row_account.and_then(last4);
    own_accounts
        .iter()
        .filter(|a| match (&row_tail, last4(&a.number)) {
            (Some(row), Some(other)) => *row != other,
            _ => true,
        })
        .any(|a| mentions(description, a))
}
