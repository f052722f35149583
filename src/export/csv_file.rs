//! CSV exports.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AttendanceStatus, Employee, EmployeeId, MonthlyLedger};

use super::report::ReportTable;

/// One row of the daily status board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBoardRow {
    /// The employee.
    #[serde(rename = "Employee ID")]
    pub employee_id: EmployeeId,
    /// The employee's name.
    #[serde(rename = "Name")]
    pub name: String,
    /// The day's status, or "not marked".
    #[serde(rename = "Status")]
    pub status: String,
}

/// Builds the status board for one day: every employee with their status,
/// in roster order. Employees without a record read "not marked".
pub fn daily_status_board(
    employees: &[Employee],
    ledger: &MonthlyLedger,
    date: NaiveDate,
) -> Vec<StatusBoardRow> {
    let entry = ledger.entry(date);
    employees
        .iter()
        .map(|employee| {
            let status = entry
                .and_then(|e| e.record_for(employee.id))
                .map(|r| r.status);
            StatusBoardRow {
                employee_id: employee.id,
                name: employee.name.clone(),
                status: board_status(status),
            }
        })
        .collect()
}

fn board_status(status: Option<AttendanceStatus>) -> String {
    match status {
        Some(status) => status.as_str().to_string(),
        None => "not marked".to_string(),
    }
}

/// File name for a day's status board export.
pub fn status_board_file_name(date: NaiveDate) -> String {
    format!("employee-attendance-{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the status board as CSV with an `Employee ID,Name,Status` header.
pub fn write_status_board<W: Write>(writer: W, rows: &[StatusBoardRow]) -> LedgerResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        out.write_record(["Employee ID", "Name", "Status"])
            .map_err(export_error)?;
    }
    for row in rows {
        out.serialize(row).map_err(export_error)?;
    }
    out.flush().map_err(|e| LedgerError::Export {
        message: e.to_string(),
    })
}

/// Writes a report table as CSV.
pub fn write_report_table<W: Write>(writer: W, table: &ReportTable) -> LedgerResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&table.headers).map_err(export_error)?;
    for row in &table.rows {
        out.write_record(row).map_err(export_error)?;
    }
    out.flush().map_err(|e| LedgerError::Export {
        message: e.to_string(),
    })
}

fn export_error(err: csv::Error) -> LedgerError {
    LedgerError::Export {
        message: err.to_string(),
    }
}
