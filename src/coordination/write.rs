//! Single-day attendance writes.
//!
//! A write for one employee on one day tries an ordered list of strategies:
//! the "mark any date" endpoint first, then a direct update of the existing
//! record or creation of a new one. Only transport and server failures move
//! on to the next strategy. While a write is in flight, a second write for
//! the same employee and day is refused.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_daily_rate, pay_for_status, reconcile, summarize_ledger};
use crate::client::{
    AttendanceQuery, AttendanceService, AttendanceUpdate, MarkRequest, NewAttendanceRecord,
    with_timeout,
};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AttendanceStatus, EmployeeId, MonthlyLedger, MonthlyReport, RecordId};

/// One way of persisting a day's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// The "mark any date" endpoint, which creates or updates server-side.
    MarkAnyDate,
    /// Update the record already on the ledger for that day.
    UpdateExisting {
        /// The record to update.
        record_id: RecordId,
    },
    /// Create a new record; used when the ledger has none for that day.
    CreateNew,
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStrategy::MarkAnyDate => write!(f, "mark-any-date"),
            WriteStrategy::UpdateExisting { record_id } => write!(f, "update-{record_id}"),
            WriteStrategy::CreateNew => write!(f, "create"),
        }
    }
}

/// A request to set one employee's status on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayWrite {
    /// The employee.
    pub employee_id: EmployeeId,
    /// The day.
    pub date: NaiveDate,
    /// The new status.
    pub status: AttendanceStatus,
    /// The employee's monthly salary, used to price the day.
    pub monthly_salary: Option<Decimal>,
}

/// The result of a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// The strategy that persisted the status.
    pub strategy: WriteStrategy,
    /// The pay sent with fallback writes.
    pub salary: Decimal,
    /// The month re-fetched after the write, or `None` if that fetch failed.
    pub report: Option<MonthlyReport>,
}

type DayKey = (EmployeeId, NaiveDate);

/// Releases an in-flight slot when dropped.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<DayKey>>>,
    key: DayKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}

/// Coordinates single-day writes.
pub struct AttendanceWriteCoordinator {
    attendance: Arc<dyn AttendanceService>,
    request_timeout: Duration,
    in_flight: Arc<Mutex<HashSet<DayKey>>>,
}

impl fmt::Debug for AttendanceWriteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttendanceWriteCoordinator")
            .field("request_timeout", &self.request_timeout)
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

impl AttendanceWriteCoordinator {
    /// Creates a coordinator writing through `attendance`.
    pub fn new(attendance: Arc<dyn AttendanceService>, request_timeout: Duration) -> Self {
        Self {
            attendance,
            request_timeout,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Returns true while a write for this employee and day is running.
    pub fn is_in_flight(&self, employee_id: EmployeeId, date: NaiveDate) -> bool {
        self.lock_in_flight().contains(&(employee_id, date))
    }

    /// Number of writes currently running.
    pub fn in_flight_count(&self) -> usize {
        self.lock_in_flight().len()
    }

    /// The strategies tried, in order, for a write against `ledger`.
    ///
    /// The fallback is chosen by whether the ledger already holds a record
    /// for that employee and day.
    pub fn plan(
        ledger: &MonthlyLedger,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Vec<WriteStrategy> {
        let fallback = match ledger.find_record(employee_id, date).and_then(|r| r.id) {
            Some(record_id) => WriteStrategy::UpdateExisting { record_id },
            None => WriteStrategy::CreateNew,
        };
        vec![WriteStrategy::MarkAnyDate, fallback]
    }

    /// Writes a day's status and returns the re-fetched month.
    ///
    /// `ledger` is the caller's current view of the month containing
    /// `write.date`; it decides the fallback and scopes the re-fetch. It is
    /// never modified: on failure the caller's state stays as it was.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::WriteInProgress`] if a write for the same day is running
    /// - [`LedgerError::DateOutsideLedger`] if `ledger` cannot hold the day
    /// - The last strategy's error when every strategy failed
    /// - The first non-retryable error from any strategy
    pub async fn mark_day(
        &self,
        ledger: &MonthlyLedger,
        write: &DayWrite,
    ) -> LedgerResult<WriteOutcome> {
        Self::check_scope(ledger, write)?;
        let _guard = self.acquire(write.employee_id, write.date)?;

        let correlation_id = Uuid::new_v4();
        let daily_rate = calculate_daily_rate(write.monthly_salary, ledger.period);
        let salary = pay_for_status(Some(write.status), daily_rate);
        let plan = Self::plan(ledger, write.employee_id, write.date);

        info!(
            correlation_id = %correlation_id,
            employee_id = %write.employee_id,
            date = %write.date,
            status = %write.status,
            "Marking attendance"
        );

        let mut last_error = None;
        let mut applied = None;
        for strategy in plan {
            match self.execute(strategy, write, salary).await {
                Ok(()) => {
                    info!(
                        correlation_id = %correlation_id,
                        strategy = %strategy,
                        "Attendance written"
                    );
                    applied = Some(strategy);
                    break;
                }
                Err(err) if err.is_retryable() => {
                    warn!(
                        correlation_id = %correlation_id,
                        strategy = %strategy,
                        error = %err,
                        "Write strategy failed; trying next"
                    );
                    last_error = Some(err);
                }
                Err(err) => {
                    error!(
                        correlation_id = %correlation_id,
                        strategy = %strategy,
                        error = %err,
                        "Write rejected"
                    );
                    return Err(err);
                }
            }
        }

        let Some(strategy) = applied else {
            error!(
                correlation_id = %correlation_id,
                employee_id = %write.employee_id,
                date = %write.date,
                "All write strategies failed"
            );
            return Err(last_error.unwrap_or_else(|| LedgerError::Network {
                message: "no write strategy available".to_string(),
            }));
        };

        let report = match self.refresh(ledger, write.monthly_salary).await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(
                    correlation_id = %correlation_id,
                    error = %err,
                    "Attendance written but the month could not be re-fetched"
                );
                None
            }
        };

        Ok(WriteOutcome {
            strategy,
            salary,
            report,
        })
    }

    fn check_scope(ledger: &MonthlyLedger, write: &DayWrite) -> LedgerResult<()> {
        let foreign = ledger.employee_id.is_some_and(|id| id != write.employee_id);
        if foreign || !ledger.period.contains_date(write.date) {
            let scope = match ledger.employee_id {
                Some(id) => format!("employee {id}, {}", ledger.period),
                None => format!("all employees, {}", ledger.period),
            };
            return Err(LedgerError::DateOutsideLedger {
                date: write.date,
                ledger: scope,
            });
        }
        Ok(())
    }

    fn acquire(&self, employee_id: EmployeeId, date: NaiveDate) -> LedgerResult<InFlightGuard> {
        let key = (employee_id, date);
        if !self.lock_in_flight().insert(key) {
            warn!(employee_id = %employee_id, date = %date, "Write already in progress");
            return Err(LedgerError::WriteInProgress { employee_id, date });
        }
        Ok(InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            key,
        })
    }

    async fn execute(
        &self,
        strategy: WriteStrategy,
        write: &DayWrite,
        salary: Decimal,
    ) -> LedgerResult<()> {
        match strategy {
            WriteStrategy::MarkAnyDate => {
                let request = MarkRequest {
                    employee_id: write.employee_id,
                    status: write.status,
                    date: write.date,
                };
                with_timeout(
                    "mark attendance",
                    self.request_timeout,
                    self.attendance.mark_any_date(&request),
                )
                .await
            }
            WriteStrategy::UpdateExisting { record_id } => {
                let update = AttendanceUpdate {
                    status: write.status,
                    salary,
                };
                with_timeout(
                    "update attendance",
                    self.request_timeout,
                    self.attendance.update_record(record_id, &update),
                )
                .await
            }
            WriteStrategy::CreateNew => {
                let record = NewAttendanceRecord {
                    employee_id: write.employee_id,
                    date: write.date,
                    status: write.status,
                    salary,
                };
                with_timeout(
                    "create attendance",
                    self.request_timeout,
                    self.attendance.create_record(&record),
                )
                .await
            }
        }
    }

    async fn refresh(
        &self,
        ledger: &MonthlyLedger,
        monthly_salary: Option<Decimal>,
    ) -> LedgerResult<MonthlyReport> {
        let query = AttendanceQuery::new(ledger.employee_id, ledger.period);
        let records = with_timeout(
            "filter attendance",
            self.request_timeout,
            self.attendance.filter_records(&query),
        )
        .await?;
        let ledger = reconcile(ledger.employee_id, ledger.period, &records);
        let summary = summarize_ledger(&ledger, monthly_salary);
        Ok(MonthlyReport { ledger, summary })
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<DayKey>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
