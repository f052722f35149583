//! Configuration types for the attendance ledger.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file. Every field has a
//! default, so an empty file yields a working configuration pointed at a
//! local backend.

use std::time::Duration;

use serde::Deserialize;

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Upper bound on every request, in seconds (1-60).
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 8,
        }
    }
}

impl ApiConfig {
    /// The request bound as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Cache freshness settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long an employee listing stays fresh, in seconds.
    pub employee_ttl_secs: u64,
    /// How long a monthly record set stays fresh, in seconds.
    pub record_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            employee_ttl_secs: 300,
            record_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    /// Employee listing TTL.
    pub fn employee_ttl(&self) -> Duration {
        Duration::from_secs(self.employee_ttl_secs)
    }

    /// Monthly record set TTL.
    pub fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_secs)
    }
}

/// Report presentation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Company name printed in the report header.
    pub company_name: String,
    /// Currency symbol prefixed to amounts.
    pub currency_symbol: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            company_name: "Attendance Ledger".to_string(),
            currency_symbol: "₹".to_string(),
        }
    }
}

/// REST paths, relative to [`ApiConfig::base_url`].
///
/// Paths containing `{id}` are expanded with [`EndpointConfig::with_id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// List every employee.
    pub employees_all: String,
    /// Fetch one employee by id.
    pub employee_by_id: String,
    /// Look an employee up by name (`?name=`).
    pub employee_by_name: String,
    /// Create an employee.
    pub employee_create: String,
    /// Update an employee.
    pub employee_update: String,
    /// Delete an employee.
    pub employee_delete: String,
    /// Filter attendance by employee, year and month.
    pub attendance_filter: String,
    /// Create an attendance record.
    pub attendance_create: String,
    /// Update an attendance record by id.
    pub attendance_update: String,
    /// Mark attendance for any date.
    pub attendance_mark_any_date: String,
    /// Mark attendance for many employees at once.
    pub bulk_mark: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            employees_all: "/api/employees/all".to_string(),
            employee_by_id: "/api/employees/getById/{id}".to_string(),
            employee_by_name: "/employees/get".to_string(),
            employee_create: "/employees/add".to_string(),
            employee_update: "/employees/update/{id}".to_string(),
            employee_delete: "/employees/delete/{id}".to_string(),
            attendance_filter: "/api/attendance/filter".to_string(),
            attendance_create: "/attendance".to_string(),
            attendance_update: "/attendance/{id}".to_string(),
            attendance_mark_any_date: "/api/attendance/mark-past".to_string(),
            bulk_mark: "/api/bulk-attendance/mark".to_string(),
        }
    }
}

impl EndpointConfig {
    /// Substitutes `{id}` in a path template.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_ledger::config::EndpointConfig;
    ///
    /// let endpoints = EndpointConfig::default();
    /// assert_eq!(
    ///     EndpointConfig::with_id(&endpoints.attendance_update, 42),
    ///     "/attendance/42"
    /// );
    /// ```
    pub fn with_id(template: &str, id: impl std::fmt::Display) -> String {
        template.replace("{id}", &id.to_string())
    }
}

/// The complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// Cache freshness settings.
    pub cache: CacheConfig,
    /// Report presentation settings.
    pub report: ReportConfig,
    /// REST paths.
    pub endpoints: EndpointConfig,
}
