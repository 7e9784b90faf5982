//! Money helpers for Indian statements: tolerant amount parsing and INR display.
//!
//! Amounts are `Decimal` end to end so sums over hundreds of rows stay exact.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

const CURRENCY_PREFIXES: &[&str] = &["₹", "INR", "Rs.", "Rs", "rs."];

/// Parse an amount as printed on a statement.
///
/// Accepts `1,234.56`, lakh grouping `1,23,456.78`, currency prefixes (`₹`, `Rs.`, `INR`),
/// a leading sign and accounting parentheses. Returns `None` for placeholders like `-`.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim();
    let mut negative = false;

    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }

    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start();
    }

    for prefix in CURRENCY_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }

    // "₹-250" style
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    }

    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Round to a fixed number of decimals, half away from zero.
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Render with the rupee sign and Indian digit grouping, e.g. `₹1,23,456.78`.
pub fn format_inr(value: Decimal, dp: u32) -> String {
    let rounded = round_money(value, dp);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", dp as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text.clone(), None),
    };

    let grouped = group_indian(&int_part);
    let sign = if negative { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}₹{grouped}.{f}"),
        None => format!("{sign}₹{grouped}"),
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), last3)
}
