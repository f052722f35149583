//! Daily rate calculation.
//!
//! The daily rate spreads a monthly salary evenly over the actual number of
//! days in the target month, so February pays more per day than March.

use rust_decimal::Decimal;

use crate::models::MonthPeriod;

/// Derives the per-day wage for a month.
///
/// A salary that is missing, zero, negative or not yet loaded yields a rate
/// of zero rather than propagating a division error.
///
/// # Examples
///
/// ```
/// use attendance_ledger::calculation::calculate_daily_rate;
/// use attendance_ledger::models::MonthPeriod;
/// use rust_decimal::Decimal;
///
/// let february = MonthPeriod::new(2024, 2).unwrap();
/// let rate = calculate_daily_rate(Some(Decimal::new(2900, 0)), february);
/// assert_eq!(rate, Decimal::new(100, 0));
///
/// assert_eq!(calculate_daily_rate(None, february), Decimal::ZERO);
/// ```
pub fn calculate_daily_rate(monthly_salary: Option<Decimal>, period: MonthPeriod) -> Decimal {
    let salary = match monthly_salary {
        Some(salary) if salary > Decimal::ZERO => salary,
        _ => return Decimal::ZERO,
    };

    let days = Decimal::from(period.days_in_month());
    salary.checked_div(days).unwrap_or(Decimal::ZERO)
}
