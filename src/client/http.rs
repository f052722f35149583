//! HTTP implementation of the backend service contracts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::config::{EndpointConfig, LedgerConfig};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Employee, EmployeeDraft, EmployeeId, RawAttendanceRecord, RecordId};

use super::{
    AttendanceQuery, AttendanceService, AttendanceUpdate, BulkAttendanceService, BulkMarkRequest,
    EmployeeDirectory, MarkRequest, NewAttendanceRecord,
};

/// Error bodies carry an optional human-readable `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Some deployments answer a name lookup with a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// A JSON-over-HTTP client for all three backend services.
///
/// Every request is bounded by the configured timeout; a request that
/// exceeds it fails with [`LedgerError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    endpoints: EndpointConfig,
    timeout: Duration,
}

impl HttpApiClient {
    /// Creates a client from the loaded configuration.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let timeout = config.api.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Network {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            timeout,
        })
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> LedgerResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| LedgerError::Network {
            message: format!("Invalid request URL '{raw}': {e}"),
        })
    }

    fn request(&self, method: Method, path: &str) -> LedgerResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Building request");
        Ok(self.client.request(method, url))
    }

    fn transport_error(&self, operation: &str, err: reqwest::Error) -> LedgerError {
        if err.is_timeout() {
            LedgerError::Timeout {
                operation: operation.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            LedgerError::Network {
                message: err.to_string(),
            }
        }
    }

    /// Sends a request and turns non-2xx answers into [`LedgerError::Server`].
    async fn send(&self, operation: &str, request: RequestBuilder) -> LedgerResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        let status = response.status();

        if status.is_success() {
            debug!(operation, status = status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        error!(
            operation,
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "Request failed"
        );
        Err(LedgerError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> LedgerResult<T> {
        let response = self.send(operation, request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        serde_json::from_str(&body).map_err(|e| LedgerError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }

    async fn send_discarding_body(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> LedgerResult<()> {
        self.send(operation, request).await.map(|_| ())
    }
}

#[async_trait]
impl EmployeeDirectory for HttpApiClient {
    async fn list_employees(&self) -> LedgerResult<Vec<Employee>> {
        let request = self.request(Method::GET, &self.endpoints.employees_all)?;
        self.send_and_deserialize("list employees", request).await
    }

    async fn get_employee(&self, id: EmployeeId) -> LedgerResult<Employee> {
        let path = EndpointConfig::with_id(&self.endpoints.employee_by_id, id);
        let request = self.request(Method::GET, &path)?;
        match self.send_and_deserialize("get employee", request).await {
            Err(LedgerError::Server { status: 404, .. }) => Err(LedgerError::EmployeeNotFound {
                id: id.to_string(),
            }),
            other => other,
        }
    }

    async fn find_employee_by_name(&self, name: &str) -> LedgerResult<Employee> {
        let request = self
            .request(Method::GET, &self.endpoints.employee_by_name)?
            .query(&[("name", name)]);
        let found: OneOrMany<Employee> = match self
            .send_and_deserialize("find employee", request)
            .await
        {
            Err(LedgerError::Server { status: 404, .. }) => {
                return Err(LedgerError::EmployeeNotFound {
                    id: name.to_string(),
                });
            }
            other => other?,
        };
        match found {
            OneOrMany::One(employee) => Ok(employee),
            OneOrMany::Many(employees) => {
                employees
                    .into_iter()
                    .next()
                    .ok_or_else(|| LedgerError::EmployeeNotFound {
                        id: name.to_string(),
                    })
            }
        }
    }

    async fn create_employee(&self, draft: &EmployeeDraft) -> LedgerResult<()> {
        let draft = draft.validated()?;
        let request = self
            .request(Method::POST, &self.endpoints.employee_create)?
            .json(&draft);
        self.send_discarding_body("create employee", request).await
    }

    async fn update_employee(&self, id: EmployeeId, draft: &EmployeeDraft) -> LedgerResult<()> {
        let draft = draft.validated()?;
        let path = EndpointConfig::with_id(&self.endpoints.employee_update, id);
        let request = self.request(Method::PUT, &path)?.json(&draft);
        self.send_discarding_body("update employee", request).await
    }

    async fn delete_employee(&self, id: EmployeeId) -> LedgerResult<()> {
        let path = EndpointConfig::with_id(&self.endpoints.employee_delete, id);
        let request = self.request(Method::DELETE, &path)?;
        self.send_discarding_body("delete employee", request).await
    }
}

#[async_trait]
impl AttendanceService for HttpApiClient {
    async fn filter_records(
        &self,
        query: &AttendanceQuery,
    ) -> LedgerResult<Vec<RawAttendanceRecord>> {
        let request = self
            .request(Method::GET, &self.endpoints.attendance_filter)?
            .query(query);
        self.send_and_deserialize("filter attendance", request).await
    }

    async fn create_record(&self, record: &NewAttendanceRecord) -> LedgerResult<()> {
        let request = self
            .request(Method::POST, &self.endpoints.attendance_create)?
            .json(record);
        self.send_discarding_body("create attendance", request).await
    }

    async fn update_record(&self, id: RecordId, update: &AttendanceUpdate) -> LedgerResult<()> {
        let path = EndpointConfig::with_id(&self.endpoints.attendance_update, id);
        let request = self.request(Method::PUT, &path)?.json(update);
        self.send_discarding_body("update attendance", request).await
    }

    async fn mark_any_date(&self, mark: &MarkRequest) -> LedgerResult<()> {
        let request = self
            .request(Method::POST, &self.endpoints.attendance_mark_any_date)?
            .query(mark);
        self.send_discarding_body("mark attendance", request).await
    }
}

#[async_trait]
impl BulkAttendanceService for HttpApiClient {
    async fn mark_bulk(&self, bulk: &BulkMarkRequest) -> LedgerResult<()> {
        let request = self
            .request(Method::POST, &self.endpoints.bulk_mark)?
            .json(bulk);
        self.send_discarding_body("bulk mark attendance", request).await
    }
}
