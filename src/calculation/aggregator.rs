//! Monthly summary aggregation.
//!
//! Folds a reconciled ledger, or a plain record list, into the counts and
//! pay figures shown on summary cards and reports.

use rust_decimal::Decimal;

use crate::models::{
    AttendanceRecord, AttendanceStatus, MonthPeriod, MonthlyLedger, MonthlySummary,
};

use super::{calculate_daily_rate, half_day_multiplier};

#[derive(Debug, Default)]
struct StatusCounts {
    present: u32,
    halfday: u32,
    absent: u32,
}

impl StatusCounts {
    fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::HalfDay => self.halfday += 1,
            AttendanceStatus::Absent => self.absent += 1,
        }
    }

    fn into_summary(
        self,
        period: MonthPeriod,
        monthly_salary: Option<Decimal>,
        unmarked: u32,
    ) -> MonthlySummary {
        let daily_rate = calculate_daily_rate(monthly_salary, period);
        let halfday_salary = daily_rate * half_day_multiplier() * Decimal::from(self.halfday);
        let total_salary = daily_rate * Decimal::from(self.present) + halfday_salary;

        MonthlySummary {
            period,
            present: self.present,
            halfday: self.halfday,
            absent: self.absent,
            unmarked,
            monthly_salary: monthly_salary
                .filter(|s| *s > Decimal::ZERO)
                .unwrap_or(Decimal::ZERO),
            daily_rate,
            halfday_salary,
            total_salary,
        }
    }
}

/// Summarizes a reconciled ledger.
///
/// Every attached record counts towards its status bucket; days with no
/// record count as unmarked. For a single-employee ledger the buckets
/// therefore always sum to the number of days in the month.
///
/// Salary figures are derived from the counts and the daily rate, so
/// `total_salary == daily_rate * present + daily_rate * 0.5 * halfday`
/// holds exactly.
///
/// # Example
///
/// ```
/// use attendance_ledger::calculation::{reconcile, summarize_ledger};
/// use attendance_ledger::models::{EmployeeId, MonthPeriod};
/// use rust_decimal::Decimal;
///
/// let period = MonthPeriod::new(2024, 4).unwrap();
/// let ledger = reconcile(Some(EmployeeId(1)), period, &[]);
/// let summary = summarize_ledger(&ledger, Some(Decimal::new(3000, 0)));
///
/// assert_eq!(summary.unmarked, 30);
/// assert_eq!(summary.daily_rate, Decimal::new(100, 0));
/// assert_eq!(summary.total_salary, Decimal::ZERO);
/// ```
pub fn summarize_ledger(
    ledger: &MonthlyLedger,
    monthly_salary: Option<Decimal>,
) -> MonthlySummary {
    let mut counts = StatusCounts::default();
    let mut unmarked = 0;

    for entry in &ledger.entries {
        if entry.is_unmarked() {
            unmarked += 1;
        }
        for record in &entry.marks {
            counts.add(record.status);
        }
    }

    counts.into_summary(ledger.period, monthly_salary, unmarked)
}

/// Summarizes a record list that has not been laid onto a calendar.
///
/// Records outside `period` are ignored. `unmarked` is always zero since a
/// record list carries no notion of missing days.
pub fn summarize_records(
    records: &[AttendanceRecord],
    period: MonthPeriod,
    monthly_salary: Option<Decimal>,
) -> MonthlySummary {
    let mut counts = StatusCounts::default();
    for record in records.iter().filter(|r| period.contains_date(r.date)) {
        counts.add(record.status);
    }
    counts.into_summary(period, monthly_salary, 0)
}

/// Sums the pay stored on the server for every record on the ledger.
///
/// This is the figure the marking screen shows. It can drift from
/// [`MonthlySummary::total_salary`] when records were written with an older
/// salary.
pub fn stored_salary_total(ledger: &MonthlyLedger) -> Decimal {
    ledger.records().map(|r| r.salary).sum()
}
