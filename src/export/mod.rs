//! Report and CSV export.
//!
//! Everything here consumes an already reconciled and summarized month and
//! produces display-ready data; no pay is recomputed.

mod csv_file;
mod format;
mod report;

pub use csv_file::{
    StatusBoardRow, daily_status_board, status_board_file_name, write_report_table,
    write_status_board,
};
pub use format::{capitalize, format_amount, format_currency, format_report_date};
pub use report::{ReportDocument, ReportTable, SummaryBox, report_file_name};
