//! The ledger service.
//!
//! [`LedgerService`] ties the backend contracts, the caches and the write
//! coordinators together into the operations a front end needs: load a
//! month, mark a day, run a bulk submission and manage the directory.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::calculation::{reconcile, summarize_ledger};
use crate::client::{
    AttendanceQuery, AttendanceService, BulkAttendanceService, EmployeeDirectory, with_timeout,
};
use crate::clock::Clock;
use crate::config::{CacheConfig, LedgerConfig};
use crate::coordination::{
    AttendanceWriteCoordinator, BulkOutcome, BulkWriteCoordinator, DayWrite, WriteOutcome,
};
use crate::error::LedgerResult;
use crate::models::{
    AttendanceStatus, Employee, EmployeeDraft, EmployeeId, MonthPeriod, MonthlyLedger,
    MonthlyReport, RawAttendanceRecord, search_employees,
};

/// Warning shown when the by-id salary lookup failed and the cached
/// directory listing was used instead.
pub const SALARY_FALLBACK_MESSAGE: &str = "Failed to load salary data. Using fallback value.";

/// A value that may have come from an expired cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    /// The value.
    pub value: T,
    /// True when a refresh failed and an expired entry was served.
    pub stale: bool,
}

/// Where a monthly salary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalarySource {
    /// The by-id directory lookup.
    Directory,
    /// The directory listing, after the by-id lookup failed.
    ListingFallback,
    /// No employee was selected.
    NotApplicable,
}

/// A resolved monthly salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryLookup {
    /// The salary, `None` when not applicable or not recorded.
    pub monthly_salary: Option<Decimal>,
    /// Where it came from.
    pub source: SalarySource,
}

impl SalaryLookup {
    /// The warning to show, if the fallback was used.
    pub fn warning(&self) -> Option<&'static str> {
        (self.source == SalarySource::ListingFallback).then_some(SALARY_FALLBACK_MESSAGE)
    }
}

/// A loaded month ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthView {
    /// The ledger and its summary.
    pub report: MonthlyReport,
    /// The salary the summary was priced with.
    pub salary: SalaryLookup,
}

/// Front-end operations over the backend services.
pub struct LedgerService {
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<dyn AttendanceService>,
    clock: Arc<dyn Clock>,
    writer: AttendanceWriteCoordinator,
    employees: CacheStore<(), Vec<Employee>>,
    records: CacheStore<AttendanceQuery, Vec<RawAttendanceRecord>>,
    cache: CacheConfig,
    request_timeout: Duration,
    generation: AtomicU64,
    record_epoch: AtomicU64,
}

impl fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerService")
            .field("cache", &self.cache)
            .field("request_timeout", &self.request_timeout)
            .field("writer", &self.writer)
            .finish()
    }
}

impl LedgerService {
    /// Creates a service over the given backends.
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        attendance: Arc<dyn AttendanceService>,
        clock: Arc<dyn Clock>,
        config: &LedgerConfig,
    ) -> Self {
        let request_timeout = config.api.request_timeout();
        Self {
            writer: AttendanceWriteCoordinator::new(Arc::clone(&attendance), request_timeout),
            employees: CacheStore::new(Arc::clone(&clock)),
            records: CacheStore::new(Arc::clone(&clock)),
            directory,
            attendance,
            clock,
            cache: config.cache.clone(),
            request_timeout,
            generation: AtomicU64::new(0),
            record_epoch: AtomicU64::new(0),
        }
    }

    /// The write coordinator used for single-day writes.
    pub fn writer(&self) -> &AttendanceWriteCoordinator {
        &self.writer
    }

    /// Lists employees, from cache while fresh.
    ///
    /// When a refresh fails and an expired listing exists, the expired
    /// listing is returned with `stale` set.
    pub async fn employees(&self) -> LedgerResult<Cached<Vec<Employee>>> {
        if let Some(employees) = self.employees.get_fresh(&(), self.cache.employee_ttl()) {
            debug!(count = employees.len(), "Employee listing served from cache");
            return Ok(Cached {
                value: employees,
                stale: false,
            });
        }

        let fetched = with_timeout(
            "list employees",
            self.request_timeout,
            self.directory.list_employees(),
        )
        .await;

        match fetched {
            Ok(employees) => {
                self.employees.insert((), employees.clone());
                Ok(Cached {
                    value: employees,
                    stale: false,
                })
            }
            Err(err) => match self.employees.get_any(&()) {
                Some(entry) => {
                    warn!(
                        error = %err,
                        age_secs = entry.age(self.clock.now()).as_secs(),
                        "Employee refresh failed; serving stale listing"
                    );
                    Ok(Cached {
                        value: entry.value,
                        stale: true,
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Lists employees whose name, role or id matches `query`.
    pub async fn search(&self, query: &str) -> LedgerResult<Cached<Vec<Employee>>> {
        let listing = self.employees().await?;
        let matches = search_employees(&listing.value, query)
            .into_iter()
            .cloned()
            .collect();
        Ok(Cached {
            value: matches,
            stale: listing.stale,
        })
    }

    /// Resolves an employee's monthly salary.
    ///
    /// Asks the directory by id first. If that fails, the employee is looked
    /// up in the directory listing and [`SALARY_FALLBACK_MESSAGE`] applies.
    pub async fn resolve_salary(&self, employee_id: EmployeeId) -> LedgerResult<SalaryLookup> {
        let lookup = with_timeout(
            "get employee",
            self.request_timeout,
            self.directory.get_employee(employee_id),
        )
        .await;

        let err = match lookup {
            Ok(employee) => {
                return Ok(SalaryLookup {
                    monthly_salary: employee.salary,
                    source: SalarySource::Directory,
                });
            }
            Err(err) => err,
        };

        warn!(employee_id = %employee_id, error = %err, "{}", SALARY_FALLBACK_MESSAGE);
        let listing = match self.employees().await {
            Ok(listing) => listing.value,
            Err(_) => return Err(err),
        };
        match listing.into_iter().find(|e| e.id == employee_id) {
            Some(employee) => Ok(SalaryLookup {
                monthly_salary: employee.salary,
                source: SalarySource::ListingFallback,
            }),
            None => Err(err),
        }
    }

    async fn salary_for(&self, employee_id: Option<EmployeeId>) -> LedgerResult<SalaryLookup> {
        match employee_id {
            Some(id) => self.resolve_salary(id).await,
            None => Ok(SalaryLookup {
                monthly_salary: None,
                source: SalarySource::NotApplicable,
            }),
        }
    }

    async fn records(&self, query: AttendanceQuery) -> LedgerResult<Vec<RawAttendanceRecord>> {
        if let Some(records) = self.records.get_fresh(&query, self.cache.record_ttl()) {
            debug!(?query, count = records.len(), "Records served from cache");
            return Ok(records);
        }
        let epoch = self.record_epoch.load(Ordering::Acquire);
        let records = with_timeout(
            "filter attendance",
            self.request_timeout,
            self.attendance.filter_records(&query),
        )
        .await?;
        // A write that landed while the fetch was in flight invalidated the
        // month; these records may predate it and must not be cached.
        if self.record_epoch.load(Ordering::Acquire) == epoch {
            self.records.insert(query, records.clone());
        } else {
            debug!(?query, "Records fetched across an invalidation; not cached");
        }
        Ok(records)
    }

    /// Loads, reconciles and summarizes a month.
    ///
    /// Returns `Ok(None)` when a later `load_month` call started before this
    /// one finished; the superseded result is discarded, including any
    /// error it ran into.
    pub async fn load_month(
        &self,
        employee_id: Option<EmployeeId>,
        period: MonthPeriod,
    ) -> LedgerResult<Option<MonthView>> {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let salary = self.salary_for(employee_id).await;
        if self.is_superseded(ticket) {
            debug!(?employee_id, %period, "Discarding superseded month load");
            return Ok(None);
        }
        let salary = salary?;

        let records = self
            .records(AttendanceQuery::new(employee_id, period))
            .await;
        if self.is_superseded(ticket) {
            debug!(?employee_id, %period, "Discarding superseded month load");
            return Ok(None);
        }
        let records = records?;

        let ledger = reconcile(employee_id, period, &records);
        if let Err(err) = ledger.ensure_consistent() {
            warn!(error = %err, "Ledger has conflicting records");
        }
        let summary = summarize_ledger(&ledger, salary.monthly_salary);
        info!(
            ?employee_id,
            %period,
            present = summary.present,
            halfday = summary.halfday,
            absent = summary.absent,
            total_salary = %summary.total_salary,
            "Month loaded"
        );

        Ok(Some(MonthView {
            report: MonthlyReport { ledger, summary },
            salary,
        }))
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::Acquire) != ticket
    }

    /// Marks one day for an employee through the write coordinator.
    ///
    /// `current` is the caller's ledger for the month containing `date`.
    /// Cached record sets for that month are invalidated once the write
    /// succeeds.
    pub async fn mark_day(
        &self,
        current: &MonthlyLedger,
        employee_id: EmployeeId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> LedgerResult<WriteOutcome> {
        let salary = self.resolve_salary(employee_id).await?;
        let write = DayWrite {
            employee_id,
            date,
            status,
            monthly_salary: salary.monthly_salary,
        };
        let outcome = self.writer.mark_day(current, &write).await?;
        self.invalidate_records(MonthPeriod::containing(date));
        Ok(outcome)
    }

    /// Builds a bulk coordinator whose roster is the current employee listing.
    pub async fn bulk_coordinator(
        &self,
        service: Arc<dyn BulkAttendanceService>,
    ) -> LedgerResult<BulkWriteCoordinator> {
        let coordinator =
            BulkWriteCoordinator::new(service, Arc::clone(&self.clock), self.request_timeout);
        coordinator.set_employees(self.employees().await?.value);
        Ok(coordinator)
    }

    /// Runs a bulk submission and invalidates the affected month on success.
    pub async fn submit_bulk(
        &self,
        bulk: &BulkWriteCoordinator,
        status: Option<AttendanceStatus>,
        date: NaiveDate,
    ) -> LedgerResult<BulkOutcome> {
        let outcome = bulk.submit(status, date).await?;
        self.invalidate_records(MonthPeriod::containing(date));
        Ok(outcome)
    }

    /// Drops every cached record set for `period`.
    ///
    /// Fetches already in flight finish normally but do not repopulate the
    /// cache.
    pub fn invalidate_records(&self, period: MonthPeriod) -> usize {
        self.record_epoch.fetch_add(1, Ordering::AcqRel);
        let dropped = self
            .records
            .invalidate_where(|q| q.year == period.year() && q.month == period.month());
        debug!(%period, dropped, "Invalidated cached records");
        dropped
    }

    /// Creates an employee.
    pub async fn create_employee(&self, draft: &EmployeeDraft) -> LedgerResult<()> {
        let draft = draft.validated()?;
        with_timeout(
            "create employee",
            self.request_timeout,
            self.directory.create_employee(&draft),
        )
        .await?;
        self.employees.invalidate_all();
        info!(name = %draft.name, "Employee created");
        Ok(())
    }

    /// Updates an employee.
    pub async fn update_employee(
        &self,
        id: EmployeeId,
        draft: &EmployeeDraft,
    ) -> LedgerResult<()> {
        let draft = draft.validated()?;
        with_timeout(
            "update employee",
            self.request_timeout,
            self.directory.update_employee(id, &draft),
        )
        .await?;
        self.employees.invalidate_all();
        info!(employee_id = %id, "Employee updated");
        Ok(())
    }

    /// Deletes an employee.
    pub async fn delete_employee(&self, id: EmployeeId) -> LedgerResult<()> {
        with_timeout(
            "delete employee",
            self.request_timeout,
            self.directory.delete_employee(id),
        )
        .await?;
        self.employees.invalidate_all();
        info!(employee_id = %id, "Employee deleted");
        Ok(())
    }

    /// Finds an employee by exact name.
    pub async fn find_employee(&self, name: &str) -> LedgerResult<Employee> {
        with_timeout(
            "find employee",
            self.request_timeout,
            self.directory.find_employee_by_name(name),
        )
        .await
    }

    /// Today's date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The month containing today.
    pub fn current_period(&self) -> LedgerResult<MonthPeriod> {
        let today = self.today();
        MonthPeriod::new(today.year(), today.month())
    }
}
