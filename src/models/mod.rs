//! Core data models for the attendance ledger.
//!
//! This module contains all the domain models used throughout the crate.

mod attendance;
mod employee;
mod ledger;
mod period;
mod summary;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, RawAttendanceRecord, RecordId, RejectionReason,
    date_matches, parse_record_date,
};
pub use employee::{
    Employee, EmployeeDraft, EmployeeId, search_employees, validate_phone_number,
};
pub use ledger::{DuplicateDay, LedgerEntry, MonthlyLedger, RejectedRecord};
pub use period::MonthPeriod;
pub use summary::{MonthlyReport, MonthlySummary};
