//! Transport seam between the operation client and the backend.
//!
//! [`Transport`] issues exactly one HTTP exchange and reports what came back.
//! It does not interpret status codes or bodies; classification happens in
//! [`crate::OperationClient`].

use opsdeck_core::prelude::*;
use opsdeck_core::OperationError;
use url::Url;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request/response exchange with the backend.
///
/// Implementations return `Err` only when no response was obtained; any
/// status code, including 4xx/5xx, is an `Ok(RawResponse)`.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// `GET <base>/<path>`
    async fn get(&self, path: &str) -> std::result::Result<RawResponse, OperationError>;

    /// `POST <base>/<path>` with a JSON body
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<RawResponse, OperationError>;
}

/// [`Transport`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("opsdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL, keeping any path
    /// prefix the base carries.
    pub fn endpoint_url(&self, path: &str) -> std::result::Result<Url, OperationError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| OperationError::network(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn finish(
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<RawResponse, OperationError> {
        let response = request
            .send()
            .await
            .map_err(|e| OperationError::network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| OperationError::network(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> std::result::Result<RawResponse, OperationError> {
        let url = self.endpoint_url(path)?;
        trace!("GET {}", url);
        Self::finish(self.client.get(url)).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<RawResponse, OperationError> {
        let url = self.endpoint_url(path)?;
        trace!("POST {}", url);
        Self::finish(self.client.post(url).json(body)).await
    }
}
