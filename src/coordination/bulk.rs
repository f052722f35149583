//! Bulk attendance writes.
//!
//! The bulk coordinator owns a roster of employees with the status last
//! shown for each, and a selection. A submission validates locally, tags
//! the selected employees optimistically, sends one batched request and
//! either commits the tags or restores the snapshot taken before them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::client::{BulkAttendanceService, BulkMarkRequest, with_timeout};
use crate::clock::Clock;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AttendanceStatus, Employee, EmployeeId};

/// Message shown when a bulk write fails without a server message.
pub const BULK_FAILURE_MESSAGE: &str = "Failed to mark attendance";

/// One row of the bulk roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// The employee.
    pub employee: Employee,
    /// The status currently displayed for the employee, if any.
    pub last_status: Option<AttendanceStatus>,
}

/// The result of a successful bulk submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Employees marked.
    pub affected: Vec<EmployeeId>,
    /// The status applied.
    pub status: AttendanceStatus,
    /// The day marked.
    pub date: NaiveDate,
    /// Confirmation text for the user.
    pub message: String,
}

/// Returns the confirmation text for `count` employees marked with `status`.
///
/// # Example
///
/// ```
/// use attendance_ledger::coordination::bulk_success_message;
/// use attendance_ledger::models::AttendanceStatus;
///
/// assert_eq!(
///     bulk_success_message(AttendanceStatus::Present, 3),
///     "Successfully marked 3 employees as Present"
/// );
/// assert_eq!(
///     bulk_success_message(AttendanceStatus::HalfDay, 2),
///     "Marked 2 employees as Half Day"
/// );
/// ```
pub fn bulk_success_message(status: AttendanceStatus, count: usize) -> String {
    match status {
        AttendanceStatus::Present => format!("Successfully marked {count} employees as Present"),
        AttendanceStatus::Absent | AttendanceStatus::HalfDay => {
            format!("Marked {count} employees as {}", status.label())
        }
    }
}

/// Snapshot of displayed statuses taken before an optimistic update.
///
/// Held only for the duration of one request, then either committed
/// (dropped) or rolled back.
#[derive(Debug)]
struct OptimisticUpdate {
    previous: Vec<(EmployeeId, Option<AttendanceStatus>)>,
}

impl OptimisticUpdate {
    fn apply(
        roster: &mut [RosterEntry],
        selection: &BTreeSet<EmployeeId>,
        status: AttendanceStatus,
    ) -> Self {
        let mut previous = Vec::with_capacity(selection.len());
        for entry in roster
            .iter_mut()
            .filter(|e| selection.contains(&e.employee.id))
        {
            previous.push((entry.employee.id, entry.last_status));
            entry.last_status = Some(status);
        }
        Self { previous }
    }

    fn rollback(self, roster: &mut [RosterEntry]) {
        for (id, status) in self.previous {
            if let Some(entry) = roster.iter_mut().find(|e| e.employee.id == id) {
                entry.last_status = status;
            }
        }
    }

    fn commit(self) {}
}

#[derive(Debug, Default)]
struct BulkState {
    roster: Vec<RosterEntry>,
    selection: BTreeSet<EmployeeId>,
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates bulk attendance submissions.
pub struct BulkWriteCoordinator {
    service: Arc<dyn BulkAttendanceService>,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
    state: Mutex<BulkState>,
    busy: AtomicBool,
}

impl fmt::Debug for BulkWriteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkWriteCoordinator")
            .field("request_timeout", &self.request_timeout)
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl BulkWriteCoordinator {
    /// Creates a coordinator with an empty roster.
    pub fn new(
        service: Arc<dyn BulkAttendanceService>,
        clock: Arc<dyn Clock>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            service,
            clock,
            request_timeout,
            state: Mutex::new(BulkState::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// Replaces the roster, keeping displayed statuses of employees still present
    /// and dropping selections of employees no longer listed.
    pub fn set_employees(&self, employees: Vec<Employee>) {
        let mut state = self.lock_state();
        let roster = employees
            .into_iter()
            .map(|employee| {
                let last_status = state
                    .roster
                    .iter()
                    .find(|e| e.employee.id == employee.id)
                    .and_then(|e| e.last_status);
                RosterEntry {
                    employee,
                    last_status,
                }
            })
            .collect::<Vec<_>>();
        state
            .selection
            .retain(|id| roster.iter().any(|e| e.employee.id == *id));
        state.roster = roster;
    }

    /// A copy of the roster.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.lock_state().roster.clone()
    }

    /// The displayed status for one employee.
    pub fn displayed_status(&self, id: EmployeeId) -> Option<AttendanceStatus> {
        self.lock_state()
            .roster
            .iter()
            .find(|e| e.employee.id == id)
            .and_then(|e| e.last_status)
    }

    /// Selects one employee.
    pub fn select(&self, id: EmployeeId) {
        self.lock_state().selection.insert(id);
    }

    /// Selects every roster employee matching `query`, replacing the selection.
    pub fn select_matching(&self, query: &str) -> usize {
        let mut state = self.lock_state();
        let selection: BTreeSet<EmployeeId> = state
            .roster
            .iter()
            .filter(|e| e.employee.matches_search(query))
            .map(|e| e.employee.id)
            .collect();
        state.selection = selection;
        state.selection.len()
    }

    /// The selected employees, ascending.
    pub fn selection(&self) -> Vec<EmployeeId> {
        self.lock_state().selection.iter().copied().collect()
    }

    /// Returns true while a submission is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Marks every selected employee with `status` on `date`.
    ///
    /// Checks run in order, each failing before any network call:
    /// a status is chosen, at least one employee is selected, and `date` is
    /// not after today. On success the selection is cleared. On failure the
    /// displayed statuses are restored; use
    /// [`LedgerError::user_message`] with [`BULK_FAILURE_MESSAGE`] to show it.
    pub async fn submit(
        &self,
        status: Option<AttendanceStatus>,
        date: NaiveDate,
    ) -> LedgerResult<BulkOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LedgerError::BulkWriteInProgress);
        }
        let _busy = BusyGuard(&self.busy);

        let (status, employee_ids) = match self.validate(status, date) {
            Ok(valid) => valid,
            Err(err) => {
                warn!(error = %err, "Bulk attendance rejected");
                return Err(err);
            }
        };

        let correlation_id = Uuid::new_v4();
        info!(
            correlation_id = %correlation_id,
            count = employee_ids.len(),
            status = %status,
            date = %date,
            "Submitting bulk attendance"
        );

        let update = {
            let mut state = self.lock_state();
            let BulkState { roster, selection } = &mut *state;
            OptimisticUpdate::apply(roster, selection, status)
        };

        let request = BulkMarkRequest {
            employee_ids: employee_ids.clone(),
            status,
            date,
        };
        let result = with_timeout(
            "bulk mark attendance",
            self.request_timeout,
            self.service.mark_bulk(&request),
        )
        .await;

        let mut state = self.lock_state();
        match result {
            Ok(()) => {
                update.commit();
                state.selection.clear();
                let message = bulk_success_message(status, employee_ids.len());
                info!(correlation_id = %correlation_id, %message, "Bulk attendance marked");
                Ok(BulkOutcome {
                    affected: employee_ids,
                    status,
                    date,
                    message,
                })
            }
            Err(err) => {
                update.rollback(&mut state.roster);
                error!(
                    correlation_id = %correlation_id,
                    error = %err,
                    "Bulk attendance failed; restored previous statuses"
                );
                Err(err)
            }
        }
    }

    fn validate(
        &self,
        status: Option<AttendanceStatus>,
        date: NaiveDate,
    ) -> LedgerResult<(AttendanceStatus, Vec<EmployeeId>)> {
        let status = status.ok_or(LedgerError::MissingStatus)?;

        let employee_ids = self.selection();
        if employee_ids.is_empty() {
            return Err(LedgerError::NoEmployeesSelected);
        }

        let today = self.clock.today();
        if date > today {
            return Err(LedgerError::FutureDate { date, today });
        }

        Ok((status, employee_ids))
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BulkState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
