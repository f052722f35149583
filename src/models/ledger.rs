//! Monthly ledger models.
//!
//! A [`MonthlyLedger`] is the dense, one-row-per-day view of a month built by
//! the reconciler. It is never patched in place: any change to the
//! underlying records produces a fresh ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

use super::{
    AttendanceRecord, AttendanceStatus, EmployeeId, MonthPeriod, RawAttendanceRecord,
    RejectionReason,
};

/// One calendar day of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// The calendar day.
    pub date: NaiveDate,
    /// Records attached to this day, at most one per employee.
    ///
    /// Empty when the day is unmarked. A single-employee ledger holds at
    /// most one record here.
    pub marks: Vec<AttendanceRecord>,
}

impl LedgerEntry {
    /// Creates an unmarked entry.
    pub fn unmarked(date: NaiveDate) -> Self {
        Self {
            date,
            marks: Vec::new(),
        }
    }

    /// Returns true when no record is attached.
    pub fn is_unmarked(&self) -> bool {
        self.marks.is_empty()
    }

    /// The first attached record.
    pub fn record(&self) -> Option<&AttendanceRecord> {
        self.marks.first()
    }

    /// The record for a specific employee.
    pub fn record_for(&self, employee_id: EmployeeId) -> Option<&AttendanceRecord> {
        self.marks.iter().find(|r| r.employee_id == employee_id)
    }

    /// The status of the first attached record, `None` when unmarked.
    pub fn status(&self) -> Option<AttendanceStatus> {
        self.record().map(|r| r.status)
    }

    /// The stored pay of the first attached record, zero when unmarked.
    pub fn salary(&self) -> Decimal {
        self.record().map(|r| r.salary).unwrap_or(Decimal::ZERO)
    }
}

/// Several records claiming the same employee and day.
///
/// The first record stays on the ledger; the rest are kept here so the
/// conflict can be reported rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDay {
    /// The employee with conflicting records.
    pub employee_id: EmployeeId,
    /// The day with conflicting records.
    pub date: NaiveDate,
    /// The records that lost to the first match.
    pub shadowed: Vec<AttendanceRecord>,
}

impl DuplicateDay {
    /// Total number of records for the day, including the one kept.
    pub fn count(&self) -> usize {
        self.shadowed.len() + 1
    }
}

/// A raw record that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    /// The record as received.
    pub record: RawAttendanceRecord,
    /// Why it was rejected.
    pub reason: RejectionReason,
}

/// The reconciled attendance of one month.
///
/// `entries` always holds exactly one entry per calendar day, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLedger {
    /// The employee the ledger is scoped to; `None` for all employees.
    pub employee_id: Option<EmployeeId>,
    /// The month covered.
    pub period: MonthPeriod,
    /// One entry per calendar day, ascending.
    pub entries: Vec<LedgerEntry>,
    /// Days with more than one record for the same employee.
    pub duplicates: Vec<DuplicateDay>,
    /// Records whose date or status could not be read.
    pub rejected: Vec<RejectedRecord>,
    /// Records dropped because they fell outside the period or scope.
    pub out_of_scope: usize,
}

impl MonthlyLedger {
    /// Returns the entry for `date`, if it falls in the period.
    pub fn entry(&self, date: NaiveDate) -> Option<&LedgerEntry> {
        if !self.period.contains_date(date) {
            return None;
        }
        self.entries.iter().find(|e| e.date == date)
    }

    /// Returns the record for an employee on a day, using the same matching
    /// rule the ledger was built with.
    pub fn find_record(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Option<&AttendanceRecord> {
        self.entry(date).and_then(|e| e.record_for(employee_id))
    }

    /// Iterates over every attached record in date order.
    pub fn records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.entries.iter().flat_map(|e| e.marks.iter())
    }

    /// Number of days with no record attached.
    pub fn unmarked_days(&self) -> usize {
        self.entries.iter().filter(|e| e.is_unmarked()).count()
    }

    /// Returns true when no duplicate day was detected.
    pub fn is_consistent(&self) -> bool {
        self.duplicates.is_empty()
    }

    /// Fails with [`LedgerError::DuplicateRecord`] for the first duplicate day.
    pub fn ensure_consistent(&self) -> LedgerResult<()> {
        match self.duplicates.first() {
            None => Ok(()),
            Some(duplicate) => Err(LedgerError::DuplicateRecord {
                employee_id: duplicate.employee_id,
                date: duplicate.date,
                count: duplicate.count(),
            }),
        }
    }
}
