//! Monthly summary model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{MonthPeriod, MonthlyLedger};

/// Aggregate attendance counts and pay for one month.
///
/// Produced by [`crate::calculation::summarize_ledger`] or
/// [`crate::calculation::summarize_records`]. Salary figures always satisfy
/// `total_salary == daily_rate * present + daily_rate * 0.5 * halfday`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The month summarized.
    pub period: MonthPeriod,
    /// Days marked present.
    pub present: u32,
    /// Days marked half day.
    pub halfday: u32,
    /// Days marked absent.
    pub absent: u32,
    /// Ledger days with no record. Always zero for record-list summaries.
    pub unmarked: u32,
    /// The monthly salary the rates were derived from (zero when unknown).
    pub monthly_salary: Decimal,
    /// `monthly_salary / days_in_month`.
    pub daily_rate: Decimal,
    /// Pay attributable to half days.
    pub halfday_salary: Decimal,
    /// Total pay for the month.
    pub total_salary: Decimal,
}

impl MonthlySummary {
    /// Number of days with a recognized status.
    pub fn marked_days(&self) -> u32 {
        self.present + self.halfday + self.absent
    }
}

/// A reconciled ledger together with its summary.
///
/// This is what every fetch and every successful write hands back to the
/// caller, so the two are always computed from the same record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// The reconciled month.
    pub ledger: MonthlyLedger,
    /// The summary of `ledger`.
    pub summary: MonthlySummary,
}
