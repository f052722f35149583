//! Attendance reconciliation.
//!
//! This module merges the sparse record set returned by the attendance
//! service onto the dense calendar of a month, producing a
//! [`MonthlyLedger`] with exactly one entry per day.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::models::{
    DuplicateDay, EmployeeId, LedgerEntry, MonthPeriod, MonthlyLedger, RawAttendanceRecord,
    RejectedRecord,
};

/// Reconciles raw records onto the calendar of `period`.
///
/// # Arguments
///
/// * `employee_id` - The employee to scope to, or `None` for all employees
/// * `period` - The month to build
/// * `records` - Records as returned by the attendance service
///
/// # Behavior
///
/// - One entry per calendar day, ascending, whatever the input order
/// - A record lands on a day if its date string equals the ISO date or its
///   portion before the `T` separator does; any other spelling, such as
///   `2024-2-5` or a padded string, is rejected as unparseable
/// - Records outside the month, or for another employee when scoped, are
///   dropped and counted in `out_of_scope`
/// - Records with an unreadable date or status are kept in `rejected`
/// - When one employee has several records on a day the first, in input
///   order, is attached and the rest are reported in `duplicates`
///
/// The function is pure: the same input always yields an equal ledger.
///
/// # Example
///
/// ```
/// use attendance_ledger::calculation::reconcile;
/// use attendance_ledger::models::{EmployeeId, MonthPeriod, RawAttendanceRecord, AttendanceStatus};
///
/// let records = vec![RawAttendanceRecord {
///     id: None,
///     employee_id: EmployeeId(1),
///     employee_name: None,
///     date: "2024-02-10T00:00:00".to_string(),
///     status: Some("present".to_string()),
///     salary: None,
/// }];
///
/// let period = MonthPeriod::new(2024, 2).unwrap();
/// let ledger = reconcile(Some(EmployeeId(1)), period, &records);
/// assert_eq!(ledger.entries.len(), 29);
/// assert_eq!(ledger.entries[9].status(), Some(AttendanceStatus::Present));
/// assert!(ledger.entries[10].is_unmarked());
/// ```
pub fn reconcile(
    employee_id: Option<EmployeeId>,
    period: MonthPeriod,
    records: &[RawAttendanceRecord],
) -> MonthlyLedger {
    let mut entries: Vec<LedgerEntry> = period.dates().map(LedgerEntry::unmarked).collect();
    let mut duplicates: Vec<DuplicateDay> = Vec::new();
    let mut rejected = Vec::new();
    let mut out_of_scope = 0;
    let mut seen: HashSet<(EmployeeId, NaiveDate)> = HashSet::new();

    for raw in records {
        if employee_id.is_some_and(|id| id != raw.employee_id) {
            out_of_scope += 1;
            continue;
        }

        let record = match raw.normalize() {
            Ok(record) => record,
            Err(reason) => {
                warn!(
                    employee_id = %raw.employee_id,
                    date = %raw.date,
                    reason = %reason,
                    "Rejected attendance record"
                );
                rejected.push(RejectedRecord {
                    record: raw.clone(),
                    reason,
                });
                continue;
            }
        };

        if !period.contains_date(record.date) {
            out_of_scope += 1;
            continue;
        }

        // Entries are dense from day 1, so the zero-based day indexes them.
        let Some(entry) = entries
            .get_mut(record.date.day0() as usize)
            .filter(|entry| raw.falls_on(entry.date))
        else {
            out_of_scope += 1;
            continue;
        };

        if seen.insert((record.employee_id, record.date)) {
            entry.marks.push(record);
        } else {
            warn!(
                employee_id = %record.employee_id,
                date = %record.date,
                "Duplicate attendance record; keeping the first"
            );
            match duplicates
                .iter_mut()
                .find(|d| d.employee_id == record.employee_id && d.date == record.date)
            {
                Some(duplicate) => duplicate.shadowed.push(record),
                None => duplicates.push(DuplicateDay {
                    employee_id: record.employee_id,
                    date: record.date,
                    shadowed: vec![record],
                }),
            }
        }
    }

    for entry in &mut entries {
        entry.marks.sort_by_key(|r| r.employee_id);
    }
    duplicates.sort_by_key(|d| (d.date, d.employee_id));

    MonthlyLedger {
        employee_id,
        period,
        entries,
        duplicates,
        rejected,
        out_of_scope,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, RecordId, RejectionReason};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn raw(id: i64, employee: i64, date: &str, status: &str) -> RawAttendanceRecord {
        RawAttendanceRecord {
            id: Some(RecordId(id)),
            employee_id: EmployeeId(employee),
            employee_name: None,
            date: date.to_string(),
            status: Some(status.to_string()),
            salary: Some(Decimal::new(100, 0)),
        }
    }

    fn february() -> MonthPeriod {
        MonthPeriod::new(2024, 2).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    /// RC-001: empty record set gives a fully unmarked month
    #[test]
    fn test_empty_records_give_unmarked_month() {
        let ledger = reconcile(Some(EmployeeId(1)), february(), &[]);
        assert_eq!(ledger.entries.len(), 29);
        assert!(ledger.entries.iter().all(LedgerEntry::is_unmarked));
        assert_eq!(ledger.entries[0].date, day(1));
        assert_eq!(ledger.entries[28].date, day(29));
    }

    /// RC-002: timestamped dates land on their calendar day
    #[test]
    fn test_timestamp_dates_are_truncated() {
        let records = vec![
            raw(1, 1, "2024-02-03", "present"),
            raw(2, 1, "2024-02-04T00:00:00", "halfday"),
            raw(3, 1, "2024-02-05T23:59:59.999Z", "ABSENT"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);

        assert_eq!(ledger.entry(day(3)).unwrap().status(), Some(AttendanceStatus::Present));
        assert_eq!(ledger.entry(day(4)).unwrap().status(), Some(AttendanceStatus::HalfDay));
        assert_eq!(ledger.entry(day(5)).unwrap().status(), Some(AttendanceStatus::Absent));
        assert_eq!(ledger.unmarked_days(), 26);
    }

    /// RC-003: input order does not affect entry order
    #[test]
    fn test_unsorted_input_gives_ascending_entries() {
        let records = vec![
            raw(1, 1, "2024-02-20", "present"),
            raw(2, 1, "2024-02-02", "present"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);
        assert!(ledger.entries.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(ledger.records().next().unwrap().id, Some(RecordId(2)));
    }

    /// RC-004: records outside the month are dropped
    #[test]
    fn test_out_of_month_records_are_filtered() {
        let records = vec![
            raw(1, 1, "2024-01-31", "present"),
            raw(2, 1, "2024-03-01", "present"),
            raw(3, 1, "2023-02-10", "present"),
            raw(4, 1, "2024-02-10", "present"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);
        assert_eq!(ledger.records().count(), 1);
        assert_eq!(ledger.out_of_scope, 3);
    }

    /// RC-005: other employees' records are dropped when scoped
    #[test]
    fn test_scoped_ledger_ignores_other_employees() {
        let records = vec![
            raw(1, 1, "2024-02-10", "present"),
            raw(2, 2, "2024-02-10", "absent"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);
        assert_eq!(ledger.entry(day(10)).unwrap().marks.len(), 1);
        assert_eq!(ledger.out_of_scope, 1);
    }

    /// RC-006: all-employee ledger attaches one record per employee
    #[test]
    fn test_all_employee_ledger_keeps_every_employee() {
        let records = vec![
            raw(1, 2, "2024-02-10", "absent"),
            raw(2, 1, "2024-02-10", "present"),
        ];
        let ledger = reconcile(None, february(), &records);
        let entry = ledger.entry(day(10)).unwrap();
        assert_eq!(entry.marks.len(), 2);
        assert_eq!(entry.marks[0].employee_id, EmployeeId(1));
        assert!(ledger.is_consistent());
    }

    /// RC-007: duplicates keep the first match and are reported
    #[test]
    fn test_duplicate_day_keeps_first_and_reports_rest() {
        let records = vec![
            raw(1, 1, "2024-02-10", "present"),
            raw(2, 1, "2024-02-10T08:00:00", "absent"),
            raw(3, 1, "2024-02-10", "halfday"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);

        let entry = ledger.entry(day(10)).unwrap();
        assert_eq!(entry.marks.len(), 1);
        assert_eq!(entry.record().unwrap().id, Some(RecordId(1)));
        assert_eq!(ledger.duplicates.len(), 1);
        assert_eq!(ledger.duplicates[0].count(), 3);
        assert!(ledger.ensure_consistent().is_err());
    }

    /// RC-008: unreadable records are flagged, not paid
    #[test]
    fn test_unknown_status_is_rejected() {
        let records = vec![raw(1, 1, "2024-02-10", "leave"), raw(2, 1, "10/02/2024", "present")];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);
        assert_eq!(ledger.unmarked_days(), 29);
        assert_eq!(ledger.rejected.len(), 2);
        assert_eq!(
            ledger.rejected[0].reason,
            RejectionReason::UnknownStatus("leave".to_string())
        );
    }

    /// RC-009: non-canonical date spellings are rejected, not placed
    #[test]
    fn test_non_canonical_dates_are_rejected() {
        let records = vec![
            raw(1, 1, "2024-2-5", "present"),
            raw(2, 1, " 2024-02-05", "present"),
            raw(3, 1, "2024-02-05 junk", "present"),
        ];
        let ledger = reconcile(Some(EmployeeId(1)), february(), &records);

        assert!(ledger.entry(day(5)).unwrap().is_unmarked());
        assert_eq!(ledger.unmarked_days(), 29);
        assert_eq!(ledger.rejected.len(), 3);
        assert_eq!(
            ledger.rejected[0].reason,
            RejectionReason::UnparseableDate("2024-2-5".to_string())
        );
        assert_eq!(
            ledger.rejected[1].reason,
            RejectionReason::UnparseableDate(" 2024-02-05".to_string())
        );
    }

    /// RC-010: reconciling twice gives equal ledgers
    #[test]
    fn test_reconcile_is_idempotent() {
        let records = vec![
            raw(1, 1, "2024-02-10", "present"),
            raw(2, 1, "2024-02-10", "absent"),
            raw(3, 1, "2024-02-11", "bogus"),
        ];
        let first = reconcile(Some(EmployeeId(1)), february(), &records);
        let second = reconcile(Some(EmployeeId(1)), february(), &records);
        assert_eq!(first, second);
    }

    fn status_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("present"), Just("halfday"), Just("absent"), Just("PRESENT")]
    }

    proptest! {
        #[test]
        fn prop_ledger_is_dense_ascending_and_unique(
            year in 1990i32..2100,
            month in 1u32..=12,
            days in proptest::collection::vec((1u32..=31, status_strategy()), 0..40),
        ) {
            let period = MonthPeriod::new(year, month).unwrap();
            let records: Vec<RawAttendanceRecord> = days
                .iter()
                .enumerate()
                .map(|(i, (d, status))| raw(i as i64, 1, &format!("{year:04}-{month:02}-{d:02}"), status))
                .collect();

            let ledger = reconcile(Some(EmployeeId(1)), period, &records);

            prop_assert_eq!(ledger.entries.len() as u32, period.days_in_month());
            prop_assert!(ledger.entries.windows(2).all(|w| w[0].date < w[1].date));
            prop_assert!(ledger.entries.iter().all(|e| e.marks.len() <= 1));
            prop_assert!(ledger.entries.iter().all(|e| period.contains_date(e.date)));
        }
    }
}
