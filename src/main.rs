use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use attendance_ledger::client::HttpApiClient;
use attendance_ledger::clock::SystemClock;
use attendance_ledger::config::{ConfigLoader, LedgerConfig};
use attendance_ledger::coordination::BULK_FAILURE_MESSAGE;
use attendance_ledger::error::{LedgerError, LedgerResult};
use attendance_ledger::export::{
    ReportDocument, daily_status_board, format_amount, format_report_date,
    status_board_file_name, write_report_table, write_status_board,
};
use attendance_ledger::models::{AttendanceStatus, EmployeeId, MonthPeriod, MonthlySummary};
use attendance_ledger::service::{LedgerService, MonthView};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/ledger.yaml";

#[derive(Parser)]
#[command(name = "attendance-ledger")]
#[command(about = "Monthly attendance ledger and salary reconciliation")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL, overriding the configuration file.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List employees.
    Employees {
        /// Filter by name, role or id.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one employee's ledger for a month.
    Ledger {
        #[arg(long)]
        employee: EmployeeId,
        /// Defaults to the current year.
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// Defaults to the current month.
        #[arg(long, requires = "year")]
        month: Option<u32>,
        /// Write the report table to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Summarize every employee's attendance for a month.
    Summary {
        /// Defaults to the current year.
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// Defaults to the current month.
        #[arg(long, requires = "year")]
        month: Option<u32>,
        /// Write the report table to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Mark one employee for one day.
    Mark {
        #[arg(long)]
        employee: EmployeeId,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        status: AttendanceStatus,
    },
    /// Mark several employees for one day.
    Bulk {
        #[arg(long)]
        status: Option<AttendanceStatus>,
        #[arg(long)]
        date: NaiveDate,
        /// Select every employee whose name, role or id matches.
        #[arg(long)]
        search: Option<String>,
        /// Comma-separated employee ids, added to any search matches.
        #[arg(long, value_delimiter = ',')]
        employees: Vec<EmployeeId>,
    },
    /// Show every employee's status for one day.
    Board {
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write the board to a CSV file in this directory.
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.user_message(&err.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>, base_url: Option<String>) -> LedgerResult<LedgerConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => ConfigLoader::load(DEFAULT_CONFIG)?,
        None => {
            debug!("No configuration file; using defaults");
            ConfigLoader::default()
        }
    };
    let loader = match base_url {
        Some(url) => loader.with_base_url(url)?,
        None => loader,
    };
    Ok(loader.into_config())
}

async fn run(cli: Cli) -> LedgerResult<ExitCode> {
    let config = load_config(cli.config.as_deref(), cli.base_url)?;
    let client = Arc::new(HttpApiClient::new(&config)?);
    let service = LedgerService::new(
        client.clone(),
        client.clone(),
        Arc::new(SystemClock),
        &config,
    );

    match cli.command {
        Command::Employees { search } => {
            let listing = service.search(search.as_deref().unwrap_or("")).await?;
            if listing.stale {
                eprintln!("warning: employee listing may be out of date");
            }
            for employee in listing.value {
                println!(
                    "{:>5}  {:<24} {:<18} {:>14}",
                    employee.id,
                    employee.name,
                    employee.role.as_deref().unwrap_or("-"),
                    format_amount(employee.monthly_salary())
                );
            }
        }
        Command::Ledger {
            employee,
            year,
            month,
            csv,
        } => {
            let period = resolve_period(&service, year, month)?;
            let Some(view) = service.load_month(Some(employee), period).await? else {
                return Ok(ExitCode::SUCCESS);
            };
            let details = service
                .employees()
                .await
                .ok()
                .and_then(|listing| listing.value.into_iter().find(|e| e.id == employee));
            let document = ReportDocument::build(&view.report, details.as_ref(), &config.report);
            print_header(&document);
            print_view(&view);
            print_summary(&view.report.summary, &config.report.currency_symbol);
            if let Some(path) = csv {
                write_table(&path, &document)?;
            }
        }
        Command::Summary { year, month, csv } => {
            let period = resolve_period(&service, year, month)?;
            let Some(view) = service.load_month(None, period).await? else {
                return Ok(ExitCode::SUCCESS);
            };
            let document = ReportDocument::build(&view.report, None, &config.report);
            print_header(&document);
            for row in &document.table.rows {
                println!("{}", row.join("  "));
            }
            print_summary(&view.report.summary, &config.report.currency_symbol);
            if let Some(path) = csv {
                write_table(&path, &document)?;
            }
        }
        Command::Mark {
            employee,
            date,
            status,
        } => {
            let period = MonthPeriod::containing(date);
            let Some(view) = service.load_month(Some(employee), period).await? else {
                return Ok(ExitCode::SUCCESS);
            };
            let outcome = service
                .mark_day(&view.report.ledger, employee, date, status)
                .await?;
            println!(
                "Marked employee {employee} as {} on {} via {}",
                status.label(),
                format_report_date(date),
                outcome.strategy
            );
            if let Some(report) = outcome.report {
                print_summary(&report.summary, &config.report.currency_symbol);
            }
        }
        Command::Bulk {
            status,
            date,
            search,
            employees,
        } => {
            let bulk = service.bulk_coordinator(client.clone()).await?;
            if let Some(query) = search {
                let matched = bulk.select_matching(&query);
                debug!(%query, matched, "Selected employees by search");
            }
            for id in employees {
                bulk.select(id);
            }
            match service.submit_bulk(&bulk, status, date).await {
                Ok(outcome) => println!("{}", outcome.message),
                Err(err) => {
                    eprintln!("error: {}", err.user_message(BULK_FAILURE_MESSAGE));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Board { date, csv_dir } => {
            let date = date.unwrap_or_else(|| service.today());
            let employees = service.employees().await?.value;
            let Some(view) = service
                .load_month(None, MonthPeriod::containing(date))
                .await?
            else {
                return Ok(ExitCode::SUCCESS);
            };
            let rows = daily_status_board(&employees, &view.report.ledger, date);
            for row in &rows {
                println!("{:>5}  {:<24} {}", row.employee_id, row.name, row.status);
            }
            if let Some(dir) = csv_dir {
                let path = dir.join(status_board_file_name(date));
                let file = File::create(&path).map_err(|e| LedgerError::Export {
                    message: format!("{}: {e}", path.display()),
                })?;
                write_status_board(file, &rows)?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn resolve_period(
    service: &LedgerService,
    year: Option<i32>,
    month: Option<u32>,
) -> LedgerResult<MonthPeriod> {
    match (year, month) {
        (Some(year), Some(month)) => MonthPeriod::new(year, month),
        _ => service.current_period(),
    }
}

fn print_header(document: &ReportDocument) {
    println!("{}", document.title);
    println!("{}", document.period_line);
    if let Some(line) = &document.employee_line {
        println!("{line}");
    }
}

fn print_view(view: &MonthView) {
    if let Some(warning) = view.salary.warning() {
        eprintln!("warning: {warning}");
    }
    for duplicate in &view.report.ledger.duplicates {
        eprintln!(
            "warning: {} records for employee {} on {}",
            duplicate.count(),
            duplicate.employee_id,
            format_report_date(duplicate.date)
        );
    }
    for rejected in &view.report.ledger.rejected {
        eprintln!(
            "warning: ignored record dated '{}': {}",
            rejected.record.date, rejected.reason
        );
    }
    for entry in &view.report.ledger.entries {
        let (status, salary) = match entry.record() {
            Some(record) => (record.status.label(), format_amount(record.salary)),
            None => ("-", "-".to_string()),
        };
        println!("{}  {:<9} {:>12}", format_report_date(entry.date), status, salary);
    }
}

fn print_summary(summary: &MonthlySummary, symbol: &str) {
    println!(
        "{}: present {}, half days {}, absent {}, unmarked {}",
        summary.period, summary.present, summary.halfday, summary.absent, summary.unmarked
    );
    println!(
        "Daily rate {symbol}{}, half-day pay {symbol}{}, total {symbol}{}",
        format_amount(summary.daily_rate),
        format_amount(summary.halfday_salary),
        format_amount(summary.total_salary)
    );
}

fn write_table(path: &Path, document: &ReportDocument) -> LedgerResult<()> {
    let file = File::create(path).map_err(|e| LedgerError::Export {
        message: format!("{}: {e}", path.display()),
    })?;
    write_report_table(file, &document.table)?;
    println!("Wrote {} (report: {})", path.display(), document.file_name);
    Ok(())
}
