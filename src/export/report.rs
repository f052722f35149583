//! Printable attendance reports.
//!
//! A [`ReportDocument`] holds everything a PDF or table renderer needs,
//! already aggregated and formatted: header lines, the six summary boxes
//! and the attendance table.

use serde::Serialize;

use crate::config::ReportConfig;
use crate::models::{Employee, MonthlyReport};

use super::format::{capitalize, format_amount, format_currency, format_report_date};

/// One labelled figure in the report's summary section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryBox {
    /// The label, e.g. "Present Days".
    pub label: String,
    /// The formatted value.
    pub value: String,
}

/// The report's attendance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Rows, one per attendance record, in date order.
    pub rows: Vec<Vec<String>>,
}

/// A fully formatted attendance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    /// Suggested file name.
    pub file_name: String,
    /// Report title.
    pub title: String,
    /// "Report Period: February 2024".
    pub period_line: String,
    /// "Ravi Kumar (ID: 12)", only for single-employee reports.
    pub employee_line: Option<String>,
    /// The six summary boxes.
    pub summary_boxes: Vec<SummaryBox>,
    /// The attendance table.
    pub table: ReportTable,
}

impl ReportDocument {
    /// Builds the report for a loaded month.
    ///
    /// Pass `employee` for a single-employee report; `None` builds the
    /// all-employees report, which adds an Employee column and shows the
    /// monthly salary as N/A.
    pub fn build(
        report: &MonthlyReport,
        employee: Option<&Employee>,
        settings: &ReportConfig,
    ) -> Self {
        let summary = &report.summary;
        let period = report.ledger.period;
        let symbol = settings.currency_symbol.as_str();

        let summary_boxes = vec![
            SummaryBox::new("Present Days", summary.present.to_string()),
            SummaryBox::new("Half Days", summary.halfday.to_string()),
            SummaryBox::new("Absent Days", summary.absent.to_string()),
            SummaryBox::new(
                "Monthly Salary",
                match employee {
                    Some(_) => format_currency(symbol, summary.monthly_salary),
                    None => "N/A".to_string(),
                },
            ),
            SummaryBox::new(
                "Salary for Half Days",
                format_currency(symbol, summary.halfday_salary),
            ),
            SummaryBox::new("Total Salary", format_currency(symbol, summary.total_salary)),
        ];

        let mut headers = vec![
            "Date".to_string(),
            "Status".to_string(),
            format!("Salary ({symbol})"),
        ];
        if employee.is_none() {
            headers.insert(0, "Employee".to_string());
        }

        let rows = report
            .ledger
            .records()
            .map(|record| {
                let mut row = vec![
                    format_report_date(record.date),
                    capitalize(record.status.as_str()),
                    format_amount(record.salary),
                ];
                if employee.is_none() {
                    row.insert(0, record.employee_name.clone().unwrap_or_default());
                }
                row
            })
            .collect();

        Self {
            file_name: report_file_name(employee, report),
            title: format!("{} - Attendance Summary", settings.company_name),
            period_line: format!("Report Period: {period}"),
            employee_line: employee.map(|e| format!("{} (ID: {})", e.name, e.id)),
            summary_boxes,
            table: ReportTable { headers, rows },
        }
    }
}

impl SummaryBox {
    fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// `Attendance_Summary_<Name or All>_<Month>_<Year>.pdf`, with spaces in the
/// name replaced by underscores.
pub fn report_file_name(employee: Option<&Employee>, report: &MonthlyReport) -> String {
    let name = employee
        .map(|e| e.name.split_whitespace().collect::<Vec<_>>().join("_"))
        .unwrap_or_else(|| "All".to_string());
    let period = report.ledger.period;
    format!(
        "Attendance_Summary_{name}_{}_{}.pdf",
        period.month_name(),
        period.year()
    )
}
