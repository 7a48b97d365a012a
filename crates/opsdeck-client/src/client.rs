//! Operation client: validate, serialize, one call, classify, parse.

use opsdeck_core::prelude::*;
use opsdeck_core::{HealthStatus, OperationError, OperationKind, OperationOutcome, OperationRequest};

use crate::transport::{RawResponse, Transport};

/// HTTP method used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Backend endpoint for one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
}

pub const HEALTH_PATH: &str = "/api/health";

/// Endpoint table.
pub fn route(kind: OperationKind) -> Route {
    let (method, path) = match kind {
        OperationKind::TelemetryPoll => (Method::Get, "/system_security_monitor"),
        OperationKind::ConnectionTest => (Method::Post, "/api/test-connections"),
        OperationKind::ListFiles => (Method::Post, "/api/list-files"),
        OperationKind::TransferFile => (Method::Post, "/api/transfer-file"),
        OperationKind::ExecuteCommand => (Method::Post, "/api/execute-command"),
    };
    Route { method, path }
}

/// Executes [`OperationRequest`]s against the backend.
///
/// Stateless: lifecycle bookkeeping (phases, epochs, history) belongs to the
/// caller. Each `dispatch` issues at most one network call and never retries.
#[derive(Debug, Clone)]
pub struct OperationClient<T> {
    transport: T,
}

impl<T: Transport + Sync> OperationClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one request to completion.
    ///
    /// Local validation failures return before the transport is touched.
    pub async fn dispatch(
        &self,
        request: OperationRequest,
    ) -> std::result::Result<OperationOutcome, OperationError> {
        request.validate()?;

        let kind = request.kind();
        let route = route(kind);
        let body = request
            .body()
            .map_err(|e| OperationError::protocol(format!("failed to encode request: {}", e)))?;

        debug!("Dispatching {} to {}", kind, route.path);

        let response = match (route.method, body) {
            (Method::Post, Some(body)) => self.transport.post_json(route.path, &body).await?,
            (Method::Post, None) => {
                return Err(OperationError::protocol(format!(
                    "missing request body for {}",
                    kind
                )))
            }
            (Method::Get, _) => self.transport.get(route.path).await?,
        };

        check_status(&response)?;
        OperationOutcome::parse(kind, &response.body)
    }

    /// `GET /api/health`. Not an operation kind; no state is kept.
    pub async fn health(&self) -> std::result::Result<HealthStatus, OperationError> {
        let response = self.transport.get(HEALTH_PATH).await?;
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| OperationError::protocol(e.to_string()))
    }
}

fn check_status(response: &RawResponse) -> std::result::Result<(), OperationError> {
    if response.is_success() {
        Ok(())
    } else {
        warn!("Backend answered with status {}", response.status);
        Err(OperationError::HttpStatus {
            code: response.status,
        })
    }
}
