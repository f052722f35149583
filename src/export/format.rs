//! Display formatting for reports.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount with Indian digit grouping and two decimals.
///
/// The last three integer digits form one group and the rest are grouped in
/// pairs. Amounts are rounded half away from zero.
///
/// # Examples
///
/// ```
/// use attendance_ledger::export::format_amount;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(format_amount(Decimal::from_str("1234567.891").unwrap()), "12,34,567.89");
/// assert_eq!(format_amount(Decimal::from_str("999").unwrap()), "999.00");
/// assert_eq!(format_amount(Decimal::ZERO), "0.00");
/// ```
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = group_indian(integer);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Formats an amount with a currency symbol, e.g. `₹1,500.00`.
pub fn format_currency(symbol: &str, amount: Decimal) -> String {
    format!("{symbol}{}", format_amount(amount))
}

/// Formats a date as `dd-mm-yyyy`.
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Upper-cases the first character and lower-cases the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
