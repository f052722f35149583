//! Wire-level tests for the HTTP client.
//!
//! Each test starts an axum server on a loopback port that plays the
//! backend, records what it received and answers with canned bodies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;

use attendance_ledger::client::{
    AttendanceQuery, AttendanceService, AttendanceUpdate, BulkAttendanceService, BulkMarkRequest,
    EmployeeDirectory, HttpApiClient, MarkRequest, NewAttendanceRecord,
};
use attendance_ledger::config::{ConfigLoader, LedgerConfig};
use attendance_ledger::error::LedgerError;
use attendance_ledger::models::{
    AttendanceStatus, EmployeeDraft, EmployeeId, MonthPeriod, RecordId,
};

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Captured {
    route: String,
    query: HashMap<String, String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

fn capture(log: &Log, route: &str, query: HashMap<String, String>, body: Value) {
    log.lock().unwrap().push(Captured {
        route: route.to_string(),
        query,
        body,
    });
}

async fn list_employees() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Asha Rao", "role": "Operator", "salary": 2900.0},
        {"id": 2, "name": "Ravi Kumar", "salary": null, "profileImage": "https://img/2.png"}
    ]))
}

async fn get_employee(Path(id): Path<i64>) -> impl IntoResponse {
    if id == 99 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Employee missing"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": id, "name": "Asha Rao", "salary": 3100.5})),
    )
}

async fn find_employee(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let name = params.get("name").cloned().unwrap_or_default();
    Json(json!([{"id": 7, "name": name, "salary": 4000}]))
}

async fn create_employee(State(log): State<Log>, Json(body): Json<Value>) -> StatusCode {
    capture(&log, "create employee", HashMap::new(), body);
    StatusCode::CREATED
}

async fn filter_attendance(
    State(log): State<Log>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    capture(&log, "filter", params, Value::Null);
    Json(json!([
        {"id": 11, "employeeId": 1, "employeeName": "Asha Rao", "date": "2024-02-01", "status": "present", "salary": 100.0},
        {"id": 12, "employeeId": 1, "date": "2024-02-02T00:00:00", "status": "HalfDay", "salary": 50}
    ]))
}

async fn mark_any_date(
    State(log): State<Log>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    capture(&log, "mark", params, Value::Null);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "Database unavailable"})),
    )
}

async fn create_attendance(State(log): State<Log>, Json(body): Json<Value>) -> StatusCode {
    capture(&log, "create attendance", HashMap::new(), body);
    StatusCode::OK
}

async fn update_attendance(
    State(log): State<Log>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> StatusCode {
    capture(&log, &format!("update attendance {id}"), HashMap::new(), body);
    StatusCode::OK
}

async fn bulk_mark(State(log): State<Log>, Json(body): Json<Value>) -> impl IntoResponse {
    capture(&log, "bulk", HashMap::new(), body);
    (StatusCode::BAD_GATEWAY, "upstream down")
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!([]))
}

async fn not_json() -> &'static str {
    "<html>maintenance</html>"
}

async fn start_backend() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/api/employees/all", get(list_employees))
        .route("/api/employees/getById/:id", get(get_employee))
        .route("/employees/get", get(find_employee))
        .route("/employees/add", post(create_employee))
        .route("/api/attendance/filter", get(filter_attendance))
        .route("/api/attendance/mark-past", post(mark_any_date))
        .route("/attendance", post(create_attendance))
        .route("/attendance/:id", put(update_attendance))
        .route("/api/bulk-attendance/mark", post(bulk_mark))
        .route("/slow", get(slow))
        .route("/maintenance", get(not_json))
        .with_state(Arc::clone(&log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), log)
}

fn client_for(base_url: &str, yaml: &str) -> HttpApiClient {
    let config: LedgerConfig = ConfigLoader::from_yaml_str(yaml)
        .unwrap()
        .with_base_url(base_url)
        .unwrap()
        .into_config();
    HttpApiClient::new(&config).unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn captured(log: &Log, route: &str) -> Vec<Captured> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| c.route == route)
        .cloned()
        .collect()
}

// =============================================================================
// Employee directory
// =============================================================================

#[tokio::test]
async fn test_list_employees_decodes_salaries() {
    let (base, _log) = start_backend().await;
    let client = client_for(&base, "{}");

    let employees = client.list_employees().await.unwrap();
    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0].salary, Some(dec("2900")));
    assert_eq!(employees[0].role.as_deref(), Some("Operator"));
    assert_eq!(employees[1].salary, None);
    assert_eq!(employees[1].avatar_url(), "https://img/2.png");
}

#[tokio::test]
async fn test_get_employee_maps_404_to_not_found() {
    let (base, _log) = start_backend().await;
    let client = client_for(&base, "{}");

    let found = client.get_employee(EmployeeId(4)).await.unwrap();
    assert_eq!(found.id, EmployeeId(4));
    assert_eq!(found.salary, Some(dec("3100.5")));

    match client.get_employee(EmployeeId(99)).await {
        Err(LedgerError::EmployeeNotFound { id }) => assert_eq!(id, "99"),
        other => panic!("Expected EmployeeNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_find_by_name_accepts_list_answer() {
    let (base, _log) = start_backend().await;
    let client = client_for(&base, "{}");

    let employee = client.find_employee_by_name("Kiran Patel").await.unwrap();
    assert_eq!(employee.id, EmployeeId(7));
    assert_eq!(employee.name, "Kiran Patel");
}

#[tokio::test]
async fn test_create_employee_sends_trimmed_draft() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    let mut draft = EmployeeDraft::new("  Kiran Patel ", dec("4200"));
    draft.role = Some("   ".to_string());
    draft.number = Some("+91-9876543210".to_string());
    client.create_employee(&draft).await.unwrap();

    let calls = captured(&log, "create employee");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].body,
        json!({"name": "Kiran Patel", "salary": 4200.0, "number": "+91-9876543210"})
    );
}

// =============================================================================
// Attendance
// =============================================================================

#[tokio::test]
async fn test_filter_sends_month_query() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    let query = AttendanceQuery::new(Some(EmployeeId(1)), MonthPeriod::new(2024, 2).unwrap());
    let records = client.filter_records(&query).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, Some(RecordId(11)));
    assert_eq!(records[1].status.as_deref(), Some("HalfDay"));
    assert_eq!(records[1].salary, Some(dec("50")));

    let calls = captured(&log, "filter");
    let expected: HashMap<String, String> = [
        ("employeeId".to_string(), "1".to_string()),
        ("year".to_string(), "2024".to_string()),
        ("month".to_string(), "2".to_string()),
    ]
    .into();
    assert_eq!(calls[0].query, expected);
}

#[tokio::test]
async fn test_filter_for_all_employees_omits_employee() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    let query = AttendanceQuery::new(None, MonthPeriod::new(2023, 12).unwrap());
    client.filter_records(&query).await.unwrap();

    let calls = captured(&log, "filter");
    assert!(!calls[0].query.contains_key("employeeId"));
    assert_eq!(calls[0].query.get("month").map(String::as_str), Some("12"));
}

#[tokio::test]
async fn test_mark_any_date_surfaces_server_message() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    let request = MarkRequest {
        employee_id: EmployeeId(3),
        status: AttendanceStatus::HalfDay,
        date: date(2024, 2, 9),
    };
    let err = client.mark_any_date(&request).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.user_message("Failed to mark attendance"), "Database unavailable");
    let calls = captured(&log, "mark");
    assert_eq!(calls[0].query.get("employeeId").map(String::as_str), Some("3"));
    assert_eq!(calls[0].query.get("status").map(String::as_str), Some("halfday"));
    assert_eq!(calls[0].query.get("date").map(String::as_str), Some("2024-02-09"));
}

#[tokio::test]
async fn test_create_and_update_send_json_bodies() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    client
        .create_record(&NewAttendanceRecord {
            employee_id: EmployeeId(1),
            date: date(2024, 2, 12),
            status: AttendanceStatus::Present,
            salary: dec("100"),
        })
        .await
        .unwrap();
    client
        .update_record(
            RecordId(12),
            &AttendanceUpdate {
                status: AttendanceStatus::Absent,
                salary: Decimal::ZERO,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        captured(&log, "create attendance")[0].body,
        json!({"employeeId": 1, "date": "2024-02-12", "status": "present", "salary": 100.0})
    );
    assert_eq!(
        captured(&log, "update attendance 12")[0].body,
        json!({"status": "absent", "salary": 0.0})
    );
}

#[tokio::test]
async fn test_bulk_failure_without_message_body() {
    let (base, log) = start_backend().await;
    let client = client_for(&base, "{}");

    let request = BulkMarkRequest {
        employee_ids: vec![EmployeeId(1), EmployeeId(2)],
        status: AttendanceStatus::Absent,
        date: date(2024, 2, 9),
    };
    let err = client.mark_bulk(&request).await.unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Server {
            status: 502,
            message: None
        }
    ));
    assert_eq!(
        err.user_message("Failed to mark attendance"),
        "Failed to mark attendance"
    );
    assert_eq!(
        captured(&log, "bulk")[0].body,
        json!({"employeeIds": [1, 2], "status": "absent", "date": "2024-02-09"})
    );
}

// =============================================================================
// Transport failures
// =============================================================================

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (base, _log) = start_backend().await;
    let client = client_for(
        &base,
        "api:\n  request_timeout_secs: 1\nendpoints:\n  employees_all: /slow\n",
    );

    match client.list_employees().await {
        Err(LedgerError::Timeout { operation, seconds }) => {
            assert_eq!(operation, "list employees");
            assert_eq!(seconds, 1);
        }
        other => panic!("Expected Timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_a_decode_error() {
    let (base, _log) = start_backend().await;
    let client = client_for(&base, "endpoints:\n  employees_all: /maintenance\n");

    let err = client.list_employees().await.unwrap_err();
    assert!(matches!(err, LedgerError::Decode { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}"), "{}");
    let err = client.list_employees().await.unwrap_err();
    assert!(matches!(err, LedgerError::Network { .. }));
}
