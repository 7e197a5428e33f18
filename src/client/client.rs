//! # API Client
//!
//! This module contains the transport half of the client: one generic operation that
//! sends a request to the backend and classifies whatever comes back.
//!
//! ## Responsibility
//!
//! [`ApiClient::submit`] takes any [`ApiRequest`] (an endpoint, a payload builder and
//! a response mapper) and resolves to either the request's output or a
//! [`ClientError`]:
//!
//! | What happened | Result |
//! |---|---|
//! | payload failed local checks | `Validation`, nothing sent |
//! | 2xx with a parseable body | the mapped output |
//! | non-2xx with an `{error}` body | `Server` carrying that message |
//! | non-2xx without one | `Server` carrying the status text |
//! | request sent, no response | `Connectivity` |
//! | anything else | `Unexpected` |
//!
//! ## Design Philosophy
//!
//! The client is stateless apart from optional metrics. It does not retry, does not
//! de-duplicate and sets no timeout; those are left to the user and the transport.
//! Keeping at most one request in flight is the job of the views in
//! [`crate::client`], which own the request state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let api = ApiClient::new("http://127.0.0.1:5000")?;
//! let students = api.submit(ListStudents).await?;
//! ```

use anyhow::Result;
use log::{debug, info, warn};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

use super::metrics::ClientMetrics;
use crate::common::error::{Action, ClientError};
use crate::common::messages::ErrorBody;

/// Payload of an outbound request.
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

/// One backend endpoint: how to build its payload and how to read its answer.
pub trait ApiRequest {
    /// Body expected on a 2xx response.
    type Response: DeserializeOwned;
    /// What the caller gets back.
    type Output;

    /// The user-facing operation, used for logging and messages.
    const ACTION: Action;

    fn method(&self) -> Method;

    /// Endpoint path, e.g. `/verify_pickup`.
    fn path(&self) -> &'static str;

    /// Build the payload. Errors here are local and stop the request from being sent.
    fn into_body(self) -> Result<RequestBody, ClientError>;

    fn into_output(response: Self::Response) -> Result<Self::Output, ClientError>;

    /// Give an endpoint the chance to read a non-2xx body as a regular answer.
    fn from_error_status(
        _status: StatusCode,
        _body: &[u8],
    ) -> Option<Result<Self::Output, ClientError>> {
        None
    }
}

/// HTTP client bound to one backend.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    metrics: Option<Arc<Mutex<ClientMetrics>>>,
}

impl ApiClient {
    /// Creates a client for the backend at `base_url` (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("safe-pickup/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            metrics: None,
        })
    }

    /// Record every submission into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Mutex<ClientMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request` and classify the result.
    pub async fn submit<R: ApiRequest>(&self, request: R) -> Result<R::Output, ClientError> {
        let request_id = Uuid::new_v4();
        let path = request.path();
        let url = format!("{}{}", self.base_url, path);

        info!("📤 [{}] {:?}: {} {}", request_id, R::ACTION, request.method(), url);

        let started = Instant::now();
        let result = self.execute(request, &url).await;
        let latency = started.elapsed();

        match &result {
            Ok(_) => info!(
                "✅ [{}] {} completed in {}ms",
                request_id,
                path,
                latency.as_millis()
            ),
            Err(e) => warn!(
                "❌ [{}] {} failed after {}ms ({:?}): {}",
                request_id,
                path,
                latency.as_millis(),
                e.kind(),
                e
            ),
        }

        if let Some(metrics) = &self.metrics {
            if let Ok(mut metrics) = metrics.lock() {
                metrics.record_request(path, latency, result.as_ref().err().map(|e| e.kind()));
            }
        }

        result
    }

    async fn execute<R: ApiRequest>(&self, request: R, url: &str) -> Result<R::Output, ClientError> {
        let builder = self.http.request(request.method(), url);

        let builder = match request.into_body()? {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();

        let body = response.bytes().await.map_err(|e| {
            warn!("Response from {} was cut off: {}", url, e);
            ClientError::Connectivity
        })?;

        debug!("{} answered {} with {} bytes", url, status, body.len());

        interpret_response::<R>(status, &body)
    }
}

/// Classify a failure to get any response at all.
fn classify_send_error(err: reqwest::Error) -> ClientError {
    if err.is_builder() {
        ClientError::unexpected(err)
    } else {
        ClientError::Connectivity
    }
}

/// Turn a received status and body into the request's output or error.
pub fn interpret_response<R: ApiRequest>(
    status: StatusCode,
    body: &[u8],
) -> Result<R::Output, ClientError> {
    if status.is_success() {
        let parsed: R::Response = serde_json::from_slice(body)
            .map_err(|e| ClientError::unexpected(format!("malformed response body: {}", e)))?;
        return R::into_output(parsed);
    }

    if let Some(output) = R::from_error_status(status, body) {
        return output;
    }

    Err(classify_error_response(status, body))
}

/// Error status: take the payload's `error` field, else the status text.
pub fn classify_error_response(status: StatusCode, body: &[u8]) -> ClientError {
    let reported = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty());

    ClientError::Server {
        status: status.as_u16(),
        reported,
        status_text: status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string(),
    }
}
