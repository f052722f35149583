//! Status to pay mapping.
//!
//! Every place that computes or displays the pay for a single day goes
//! through [`pay_for_status`], so a half day is worth exactly half the daily
//! rate everywhere.

use rust_decimal::Decimal;

use crate::models::AttendanceStatus;

/// Returns the half day multiplier (0.5).
pub fn half_day_multiplier() -> Decimal {
    Decimal::new(5, 1)
}

/// Returns the pay for one day with the given status.
///
/// `None` stands for an unmarked day and pays nothing.
///
/// # Examples
///
/// ```
/// use attendance_ledger::calculation::pay_for_status;
/// use attendance_ledger::models::AttendanceStatus;
/// use rust_decimal::Decimal;
///
/// let rate = Decimal::new(100, 0);
/// assert_eq!(pay_for_status(Some(AttendanceStatus::Present), rate), rate);
/// assert_eq!(pay_for_status(Some(AttendanceStatus::HalfDay), rate), Decimal::new(50, 0));
/// assert_eq!(pay_for_status(None, rate), Decimal::ZERO);
/// ```
pub fn pay_for_status(status: Option<AttendanceStatus>, daily_rate: Decimal) -> Decimal {
    match status {
        Some(AttendanceStatus::Present) => daily_rate,
        Some(AttendanceStatus::HalfDay) => daily_rate * half_day_multiplier(),
        Some(AttendanceStatus::Absent) | None => Decimal::ZERO,
    }
}

/// Returns the pay for a day given the status as a wire string.
///
/// The string is matched case-insensitively; empty or unrecognized
/// statuses pay nothing.
pub fn pay_for_status_str(status: &str, daily_rate: Decimal) -> Decimal {
    pay_for_status(status.parse().ok(), daily_rate)
}
