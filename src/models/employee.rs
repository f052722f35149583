//! Employee model and directory helpers.
//!
//! This module defines the [`Employee`] record as served by the employee
//! directory, the [`EmployeeDraft`] used to create or update one, and the
//! validation rules the directory forms apply before anything is sent.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Contact numbers: digits, `+` or `-`, between 1 and 15 characters.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+\-0-9]{1,15}$").expect("phone pattern is valid"));

const AVATAR_BASE_URL: &str = "https://ui-avatars.com/api/";

/// Stable identifier of an employee in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(EmployeeId)
            .map_err(|_| LedgerError::EmployeeNotFound { id: s.to_string() })
    }
}

/// An employee as listed by the directory service.
///
/// Only `salary` feeds pay calculations; the remaining fields are carried
/// for display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: EmployeeId,
    /// Display name.
    pub name: String,
    /// Job title, if recorded.
    #[serde(default)]
    pub role: Option<String>,
    /// Monthly salary. `None` while the directory has not supplied one.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub salary: Option<Decimal>,
    /// Contact number.
    #[serde(default)]
    pub number: Option<String>,
    /// Profile image URL.
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl Employee {
    /// Returns the monthly salary, treating a missing or negative value as zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_ledger::models::{Employee, EmployeeId};
    /// use rust_decimal::Decimal;
    ///
    /// let employee = Employee {
    ///     id: EmployeeId(1),
    ///     name: "Asha".to_string(),
    ///     role: None,
    ///     salary: None,
    ///     number: None,
    ///     profile_image: None,
    /// };
    /// assert_eq!(employee.monthly_salary(), Decimal::ZERO);
    /// ```
    pub fn monthly_salary(&self) -> Decimal {
        self.salary
            .filter(|s| *s > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO)
    }

    /// Returns the profile image, or a generated initials avatar when none is set.
    pub fn avatar_url(&self) -> String {
        match self.profile_image.as_deref().map(str::trim) {
            Some(image) if !image.is_empty() => image.to_string(),
            _ => {
                let name: String = url::form_urlencoded::byte_serialize(self.name.as_bytes())
                    .collect::<String>()
                    .replace('+', "%20");
                format!("{AVATAR_BASE_URL}?name={name}&background=0077BE&color=fff")
            }
        }
    }

    /// Returns true when the name or role contains `query` (case-insensitive)
    /// or the identifier contains it as a substring.
    ///
    /// An empty query matches everyone.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.id.to_string().contains(query)
            || self
                .role
                .as_deref()
                .is_some_and(|role| role.to_lowercase().contains(&needle))
    }
}

/// Filters a directory listing by [`Employee::matches_search`], preserving order.
pub fn search_employees<'a>(employees: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    employees.iter().filter(|e| e.matches_search(query)).collect()
}

/// The fields submitted when creating or updating an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    /// Display name (required).
    pub name: String,
    /// Job title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Monthly salary (must not be negative).
    #[serde(with = "rust_decimal::serde::float")]
    pub salary: Decimal,
    /// Contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Profile image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl EmployeeDraft {
    /// Creates a draft with only the required fields set.
    pub fn new(name: impl Into<String>, salary: Decimal) -> Self {
        Self {
            name: name.into(),
            role: None,
            salary,
            number: None,
            profile_image: None,
        }
    }

    /// Validates the draft and returns a trimmed copy ready to submit.
    ///
    /// Blank optional fields are dropped rather than sent as empty strings.
    pub fn validated(&self) -> LedgerResult<EmployeeDraft> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidEmployee {
                field: "name".to_string(),
                message: "is required".to_string(),
            });
        }
        if self.salary < Decimal::ZERO {
            return Err(LedgerError::InvalidEmployee {
                field: "salary".to_string(),
                message: "cannot be negative".to_string(),
            });
        }

        let number = non_blank(self.number.as_deref());
        if let Some(number) = &number {
            validate_phone_number(number)?;
        }

        Ok(EmployeeDraft {
            name: name.to_string(),
            role: non_blank(self.role.as_deref()),
            salary: self.salary,
            number,
            profile_image: non_blank(self.profile_image.as_deref()),
        })
    }
}

/// Checks a contact number against the directory's format rule.
///
/// # Examples
///
/// ```
/// use attendance_ledger::models::validate_phone_number;
///
/// assert!(validate_phone_number("+91-9876543210").is_ok());
/// assert!(validate_phone_number("98765 43210").is_err());
/// ```
pub fn validate_phone_number(value: &str) -> LedgerResult<()> {
    if PHONE_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(LedgerError::InvalidPhoneNumber {
            value: value.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
