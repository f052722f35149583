//! Backend service contracts.
//!
//! The ledger talks to three services: the employee directory, the
//! attendance service and the bulk attendance service. Each is a trait so
//! the coordinators can run against [`HttpApiClient`] in production and
//! against in-memory fakes in tests.

mod http;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AttendanceStatus, Employee, EmployeeDraft, EmployeeId, MonthPeriod, RawAttendanceRecord,
    RecordId,
};

pub use http::HttpApiClient;

/// Query for the attendance filter endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    /// Restrict to one employee; `None` returns every employee's records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<EmployeeId>,
    /// The year.
    pub year: i32,
    /// The 1-based month.
    pub month: u32,
}

impl AttendanceQuery {
    /// Builds the query for one month.
    pub fn new(employee_id: Option<EmployeeId>, period: MonthPeriod) -> Self {
        Self {
            employee_id,
            year: period.year(),
            month: period.month(),
        }
    }

    /// The month this query covers.
    pub fn period(&self) -> LedgerResult<MonthPeriod> {
        MonthPeriod::new(self.year, self.month)
    }
}

/// Body for creating an attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendanceRecord {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The day, sent as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// The status.
    pub status: AttendanceStatus,
    /// Pay for the day.
    #[serde(with = "rust_decimal::serde::float")]
    pub salary: Decimal,
}

/// Body for updating an attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    /// The new status.
    pub status: AttendanceStatus,
    /// Pay for the day at the new status.
    #[serde(with = "rust_decimal::serde::float")]
    pub salary: Decimal,
}

/// Query for the "mark any date" endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The status.
    pub status: AttendanceStatus,
    /// The day, sent as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// Body for the bulk attendance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkRequest {
    /// Every employee to mark.
    pub employee_ids: Vec<EmployeeId>,
    /// The status applied to all of them.
    pub status: AttendanceStatus,
    /// The day, sent as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// The employee directory service.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Lists every employee.
    async fn list_employees(&self) -> LedgerResult<Vec<Employee>>;

    /// Fetches one employee by id.
    async fn get_employee(&self, id: EmployeeId) -> LedgerResult<Employee>;

    /// Looks an employee up by exact name.
    async fn find_employee_by_name(&self, name: &str) -> LedgerResult<Employee>;

    /// Creates an employee from a validated draft.
    async fn create_employee(&self, draft: &EmployeeDraft) -> LedgerResult<()>;

    /// Replaces an employee's fields with a validated draft.
    async fn update_employee(&self, id: EmployeeId, draft: &EmployeeDraft) -> LedgerResult<()>;

    /// Deletes an employee.
    async fn delete_employee(&self, id: EmployeeId) -> LedgerResult<()>;
}

/// The attendance service.
#[async_trait]
pub trait AttendanceService: Send + Sync {
    /// Returns the records for a month, optionally for one employee.
    async fn filter_records(&self, query: &AttendanceQuery)
    -> LedgerResult<Vec<RawAttendanceRecord>>;

    /// Creates a record.
    async fn create_record(&self, record: &NewAttendanceRecord) -> LedgerResult<()>;

    /// Updates an existing record.
    async fn update_record(&self, id: RecordId, update: &AttendanceUpdate) -> LedgerResult<()>;

    /// Sets the status for an employee on any date, creating or updating as needed.
    async fn mark_any_date(&self, request: &MarkRequest) -> LedgerResult<()>;
}

/// The bulk attendance service.
#[async_trait]
pub trait BulkAttendanceService: Send + Sync {
    /// Marks every listed employee with one status on one day.
    ///
    /// All-or-nothing from the caller's point of view.
    async fn mark_bulk(&self, request: &BulkMarkRequest) -> LedgerResult<()>;
}

/// Runs `call` with an upper bound; expiry becomes [`LedgerError::Timeout`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use attendance_ledger::client::with_timeout;
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let value = with_timeout("ping", Duration::from_secs(1), async { Ok(7) }).await;
/// assert_eq!(value.unwrap(), 7);
/// # }
/// ```
pub async fn with_timeout<T, F>(operation: &str, bound: Duration, call: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    match tokio::time::timeout(bound, call).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout {
            operation: operation.to_string(),
            seconds: bound.as_secs(),
        }),
    }
}
