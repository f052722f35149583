//! Attendance status and record models.
//!
//! Records arrive from the attendance service as [`RawAttendanceRecord`]s with
//! free-form `date` and `status` strings. They are normalized exactly once,
//! at this boundary, into [`AttendanceRecord`]s carrying a calendar date and
//! a closed [`AttendanceStatus`]. Records that cannot be normalized are
//! reported as a [`RejectionReason`] instead of silently paying zero.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

use super::EmployeeId;

/// The attendance status of one employee on one day.
///
/// # Example
///
/// ```
/// use attendance_ledger::models::AttendanceStatus;
///
/// let status: AttendanceStatus = "HalfDay".parse().unwrap();
/// assert_eq!(status, AttendanceStatus::HalfDay);
/// assert_eq!(status.as_str(), "halfday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Worked the full day; paid the daily rate.
    Present,
    /// Worked half the day; paid half the daily rate.
    HalfDay,
    /// Did not work; paid nothing.
    Absent,
}

impl AttendanceStatus {
    /// All statuses, in display order.
    pub const ALL: [AttendanceStatus; 3] = [
        AttendanceStatus::Present,
        AttendanceStatus::HalfDay,
        AttendanceStatus::Absent,
    ];

    /// The wire spelling used by the attendance service.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::HalfDay => "halfday",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// The human-readable label used in messages and reports.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::HalfDay => "Half Day",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = LedgerError;

    /// Parses a status case-insensitively. Spaces, hyphens and underscores
    /// are ignored so `"Half Day"` and `"half-day"` both read as `HalfDay`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "halfday" => Ok(AttendanceStatus::HalfDay),
            "absent" => Ok(AttendanceStatus::Absent),
            "" => Err(LedgerError::MissingStatus),
            _ => Err(LedgerError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Identifier of an attendance record on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attendance record exactly as the attendance service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttendanceRecord {
    /// Server identifier; absent on records the server has not persisted.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// The employee the record belongs to.
    pub employee_id: EmployeeId,
    /// Denormalized employee name, present in multi-employee listings.
    #[serde(default)]
    pub employee_name: Option<String>,
    /// Either `YYYY-MM-DD` or a timestamp such as `YYYY-MM-DDTHH:MM:SS`.
    pub date: String,
    /// Wire status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Pay attributed to the day.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub salary: Option<Decimal>,
}

/// Why a raw record could not be placed on a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The date string has no recognizable calendar-date portion.
    UnparseableDate(String),
    /// The status string names no known status.
    UnknownStatus(String),
    /// The status was missing or blank.
    MissingStatus,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UnparseableDate(date) => write!(f, "unparseable date '{date}'"),
            RejectionReason::UnknownStatus(status) => write!(f, "unknown status '{status}'"),
            RejectionReason::MissingStatus => write!(f, "missing status"),
        }
    }
}

impl RawAttendanceRecord {
    /// Returns the calendar-date portion of the record's date.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }

    /// Returns true if the record falls on `date`.
    ///
    /// A record matches when its date string equals the ISO date exactly, or
    /// when the portion before a `T` separator does.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        date_matches(&self.date, date)
    }

    /// Normalizes the record into a typed [`AttendanceRecord`].
    pub fn normalize(&self) -> Result<AttendanceRecord, RejectionReason> {
        let date = self
            .calendar_date()
            .ok_or_else(|| RejectionReason::UnparseableDate(self.date.clone()))?;

        let status = match self.status.as_deref() {
            None => return Err(RejectionReason::MissingStatus),
            Some(raw) => match raw.parse::<AttendanceStatus>() {
                Ok(status) => status,
                Err(LedgerError::MissingStatus) => return Err(RejectionReason::MissingStatus),
                Err(_) => return Err(RejectionReason::UnknownStatus(raw.to_string())),
            },
        };

        Ok(AttendanceRecord {
            id: self.id,
            employee_id: self.employee_id,
            employee_name: self.employee_name.clone(),
            date,
            status,
            salary: self.salary.unwrap_or(Decimal::ZERO),
        })
    }
}

/// A normalized attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Server identifier, if the record has been persisted.
    pub id: Option<RecordId>,
    /// The employee the record belongs to.
    pub employee_id: EmployeeId,
    /// Denormalized employee name.
    pub employee_name: Option<String>,
    /// The calendar day.
    pub date: NaiveDate,
    /// The status for the day.
    pub status: AttendanceStatus,
    /// Pay attributed to the day, as stored on the server.
    pub salary: Decimal,
}

/// Extracts the calendar date from a record date string.
///
/// The string, or its portion before a `T` separator, must be exactly the
/// canonical `YYYY-MM-DD` form. Anything else is unreadable.
///
/// # Example
///
/// ```
/// use attendance_ledger::models::parse_record_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 2, 5);
/// assert_eq!(parse_record_date("2024-02-05"), expected);
/// assert_eq!(parse_record_date("2024-02-05T09:30:00"), expected);
/// assert_eq!(parse_record_date("2024-2-5"), None);
/// assert_eq!(parse_record_date("05/02/2024"), None);
/// ```
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split('T').next()?;
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    (date.format("%Y-%m-%d").to_string() == day).then_some(date)
}

/// Applies the record date matching rule: exact string equality with the
/// ISO date, or equality of the portion before the `T` separator.
pub fn date_matches(raw: &str, date: NaiveDate) -> bool {
    parse_record_date(raw) == Some(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(date: &str, status: Option<&str>) -> RawAttendanceRecord {
        RawAttendanceRecord {
            id: Some(RecordId(1)),
            employee_id: EmployeeId(7),
            employee_name: Some("Ravi".to_string()),
            date: date.to_string(),
            status: status.map(str::to_string),
            salary: Some(dec("100")),
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "PRESENT".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Present
        );
        assert_eq!(
            "HalfDay".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::HalfDay
        );
        assert_eq!(
            "Half Day".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::HalfDay
        );
        assert_eq!(
            "absent".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Absent
        );
    }

    #[test]
    fn test_status_parse_flags_unknown_and_empty() {
        assert!(matches!(
            "late".parse::<AttendanceStatus>(),
            Err(LedgerError::UnknownStatus { value }) if value == "late"
        ));
        assert!(matches!(
            "".parse::<AttendanceStatus>(),
            Err(LedgerError::MissingStatus)
        ));
    }

    #[test]
    fn test_status_serializes_to_wire_spelling() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfDay).unwrap(),
            "\"halfday\""
        );
        assert_eq!(AttendanceStatus::HalfDay.label(), "Half Day");
    }

    #[test]
    fn test_deserialize_raw_record_from_filter_response() {
        let json = r#"{
            "id": 91,
            "employeeId": 7,
            "employeeName": "Ravi",
            "date": "2024-02-05T00:00:00",
            "status": "present",
            "salary": 103.45
        }"#;

        let record: RawAttendanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(RecordId(91)));
        assert_eq!(record.salary, Some(dec("103.45")));
        assert_eq!(record.calendar_date(), Some(date(2024, 2, 5)));
    }

    #[test]
    fn test_date_matching_rule() {
        let day = date(2024, 2, 5);
        assert!(date_matches("2024-02-05", day));
        assert!(date_matches("2024-02-05T18:45:00.000+00:00", day));
        assert!(!date_matches("2024-02-06", day));
        assert!(!date_matches("2024-2-5", day));
        assert!(!date_matches(" 2024-02-05", day));
        assert!(!date_matches("2024-02-05 09:00", day));
    }

    #[test]
    fn test_non_canonical_dates_are_unparseable() {
        for raw in ["2024-2-5", " 2024-02-05", "2024-02-05 junk", "+2024-02-05"] {
            assert_eq!(parse_record_date(raw), None, "{raw:?}");
        }
        assert_eq!(
            parse_record_date("2024-02-05T00:00:00.000Z"),
            Some(date(2024, 2, 5))
        );
    }

    #[test]
    fn test_normalize_keeps_server_salary() {
        let record = raw("2024-02-05", Some("HALFDAY")).normalize().unwrap();
        assert_eq!(record.status, AttendanceStatus::HalfDay);
        assert_eq!(record.date, date(2024, 2, 5));
        assert_eq!(record.salary, dec("100"));
    }

    #[test]
    fn test_normalize_rejects_bad_inputs() {
        assert_eq!(
            raw("yesterday", Some("present")).normalize(),
            Err(RejectionReason::UnparseableDate("yesterday".to_string()))
        );
        assert_eq!(
            raw("2024-02-05", Some("holiday")).normalize(),
            Err(RejectionReason::UnknownStatus("holiday".to_string()))
        );
        assert_eq!(
            raw("2024-02-05", None).normalize(),
            Err(RejectionReason::MissingStatus)
        );
        assert_eq!(
            raw("2024-02-05", Some("  ")).normalize(),
            Err(RejectionReason::MissingStatus)
        );
    }
}
