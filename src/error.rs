//! Error types for the attendance ledger.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the ledger, its coordinators and its HTTP client can
//! report. Errors fall into four families: validation (rejected before any
//! network call), transport (`Network`, `Timeout`), server (`Server`) and
//! data integrity (`DuplicateRecord`).

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::EmployeeId;

/// The main error type for the attendance ledger.
///
/// # Example
///
/// ```
/// use attendance_ledger::error::LedgerError;
///
/// let error = LedgerError::ConfigNotFound {
///     path: "/missing/ledger.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/ledger.yaml");
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No attendance status was chosen.
    #[error("Please select attendance status")]
    MissingStatus,

    /// A bulk write was requested without any employee selected.
    #[error("Please select at least one employee")]
    NoEmployeesSelected,

    /// Attendance cannot be marked for a date after today.
    #[error("Cannot mark attendance for future date {date} (today is {today})")]
    FutureDate {
        /// The rejected date.
        date: NaiveDate,
        /// The consumer's local date at the time of the check.
        today: NaiveDate,
    },

    /// Contact numbers may contain only digits, `+` or `-`, at most 15 characters.
    #[error("Invalid phone number '{value}': use +, - or digits (max 15 characters)")]
    InvalidPhoneNumber {
        /// The rejected value.
        value: String,
    },

    /// The requested year/month does not name a calendar month.
    #[error("Invalid period {year}-{month}")]
    InvalidPeriod {
        /// The requested year.
        year: i32,
        /// The requested month (expected 1-12).
        month: u32,
    },

    /// A single-day write targeted a ledger that cannot hold that day.
    #[error("Cannot write {date} against the ledger for {ledger}")]
    DateOutsideLedger {
        /// The day being written.
        date: NaiveDate,
        /// The ledger's scope, e.g. "employee 3, February 2024".
        ledger: String,
    },

    /// A status string did not name a known attendance status.
    #[error("Unknown attendance status '{value}'")]
    UnknownStatus {
        /// The unrecognized wire value.
        value: String,
    },

    /// An employee record was invalid or contained inconsistent data.
    #[error("Invalid employee field '{field}': {message}")]
    InvalidEmployee {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A write for the same employee and day is still in flight.
    #[error("Attendance for employee {employee_id} on {date} is already being updated")]
    WriteInProgress {
        /// The employee being written.
        employee_id: EmployeeId,
        /// The day being written.
        date: NaiveDate,
    },

    /// A bulk submission is still in flight.
    #[error("A bulk attendance update is already in progress")]
    BulkWriteInProgress,

    /// The request never produced a response (connection refused, DNS, reset).
    #[error("Network error: {message}")]
    Network {
        /// A description of the transport failure.
        message: String,
    },

    /// The request did not complete within the configured bound.
    #[error("Request '{operation}' timed out after {seconds}s")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The bound that was exceeded.
        seconds: u64,
    },

    /// The backend answered with a non-2xx status.
    #[error("Server error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        /// The HTTP status code.
        status: u16,
        /// The `message` field of the error body, when one was sent.
        message: Option<String>,
    },

    /// A response body could not be decoded.
    #[error("Failed to decode response for '{operation}': {message}")]
    Decode {
        /// The operation whose response was malformed.
        operation: String,
        /// A description of the decode failure.
        message: String,
    },

    /// More than one record exists for the same employee and day.
    #[error("Employee {employee_id} has {count} attendance records on {date}")]
    DuplicateRecord {
        /// The affected employee.
        employee_id: EmployeeId,
        /// The affected day.
        date: NaiveDate,
        /// How many records share that day.
        count: usize,
    },

    /// No employee with the given identifier exists.
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// The identifier or name that was looked up.
        id: String,
    },

    /// A report or CSV file could not be produced.
    #[error("Export failed: {message}")]
    Export {
        /// A description of the export failure.
        message: String,
    },
}

impl LedgerError {
    /// Returns true for errors raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::MissingStatus
                | LedgerError::NoEmployeesSelected
                | LedgerError::FutureDate { .. }
                | LedgerError::InvalidPhoneNumber { .. }
                | LedgerError::InvalidPeriod { .. }
                | LedgerError::DateOutsideLedger { .. }
                | LedgerError::UnknownStatus { .. }
                | LedgerError::InvalidEmployee { .. }
        )
    }

    /// Returns true for transport and server failures.
    ///
    /// These are the failures that move a single-day write on to its next
    /// strategy, and that a caller may offer to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Network { .. } | LedgerError::Timeout { .. } | LedgerError::Server { .. }
        )
    }

    /// Returns the message to show a user.
    ///
    /// Server errors carry the backend's own message when it sent one;
    /// otherwise `fallback` is used. Every other variant uses its display text.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_ledger::error::LedgerError;
    ///
    /// let silent = LedgerError::Server { status: 500, message: None };
    /// assert_eq!(silent.user_message("Failed to mark attendance"), "Failed to mark attendance");
    ///
    /// let chatty = LedgerError::Server { status: 400, message: Some("Date locked".into()) };
    /// assert_eq!(chatty.user_message("Failed to mark attendance"), "Date locked");
    /// ```
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            LedgerError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            LedgerError::Server { .. }
            | LedgerError::Network { .. }
            | LedgerError::Timeout { .. }
            | LedgerError::Decode { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
