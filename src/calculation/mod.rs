//! Calculation logic for the attendance ledger.
//!
//! This module contains the pure functions that turn raw attendance records
//! into pay: the daily rate for a month, the pay for a single status,
//! reconciliation of records onto the calendar, and monthly aggregation.

mod aggregator;
mod daily_rate;
mod reconciler;
mod status_pay;

pub use aggregator::{stored_salary_total, summarize_ledger, summarize_records};
pub use daily_rate::calculate_daily_rate;
pub use reconciler::reconcile;
pub use status_pay::{half_day_multiplier, pay_for_status, pay_for_status_str};
