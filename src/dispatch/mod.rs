#[cfg(feature = "default-http-client")]
pub mod client;
pub mod redact;
pub mod request;
pub mod response;

use std::{collections::BTreeMap, fmt::Display, time::Duration};

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower::{timeout::Timeout, BoxError, Service, ServiceExt};

use self::{redact::RedactPolicy, request::WebhookRequest, response::WebhookResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const ACCEPTED_MESSAGE: &str = "Webhook request has been sent asynchronously";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// transport failure, timeout, or a target url that cannot be requested
    Network,
    /// the request cannot be built, such as an invalid method token or header
    Malformed,
}
impl ErrorKind {
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::Network => http::StatusCode::SERVICE_UNAVAILABLE,
            Self::Malformed => http::StatusCode::BAD_REQUEST,
        }
    }
}
impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Malformed => write!(f, "malformed"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} error: {message}")]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub message: String,
}
impl DispatchError {
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self { kind: ErrorKind::Network, message: message.into() }
    }
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self { kind: ErrorKind::Malformed, message: message.into() }
    }
    pub fn transport(err: BoxError, timeout: Duration) -> Self {
        if err.is::<tower::timeout::error::Elapsed>() {
            return Self::network(format!("request timed out after {:?}", timeout));
        }
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::network(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
}
impl From<&WebhookRequest> for RequestSummary {
    fn from(request: &WebhookRequest) -> Self {
        Self { method: request.method.to_ascii_uppercase(), url: request.url.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoedRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "webhook_status", rename_all = "snake_case")]
pub enum DispatchResult {
    Accepted { message: String, webhook_request: RequestSummary },
    Success { webhook_request: EchoedRequest, webhook_response: WebhookResponse },
    Error { error: DispatchError, webhook_request: RequestSummary },
}
impl DispatchResult {
    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
    pub fn response(&self) -> Option<&WebhookResponse> {
        match self {
            Self::Success { webhook_response, .. } => Some(webhook_response),
            _ => None,
        }
    }
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Any [`Service`] that can carry a built request to its target, such as the reqwest backed `DefaultHttpClient`.
pub trait Transport:
    Service<http::Request<Bytes>, Response = http::Response<Bytes>, Error: Into<BoxError>, Future: Send + 'static>
    + Clone
    + Send
    + Sync
    + 'static
{
}
impl<T> Transport for T where
    T: Service<http::Request<Bytes>, Response = http::Response<Bytes>, Error: Into<BoxError>, Future: Send + 'static>
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Sends concrete requests through an injected transport.
///
/// The transport is any [`Service`] from `http::Request<Bytes>` to `http::Response<Bytes>`, wrapped in a
/// [`Timeout`]. It is cloned per call, so it must share its connection pool between clones.
#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    service: Timeout<S>,
    timeout: Duration,
    redact: RedactPolicy,
}
impl<S> Dispatcher<S> {
    pub fn new(service: S) -> Self {
        Self::with_timeout(service, DEFAULT_TIMEOUT)
    }
    pub fn with_timeout(service: S, timeout: Duration) -> Self {
        Self { service: Timeout::new(service, timeout), timeout, redact: Default::default() }
    }
    pub fn redact_policy(self, redact: RedactPolicy) -> Self {
        Self { redact, ..self }
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
impl<S: Transport> Dispatcher<S> {
    pub async fn dispatch(&self, request: WebhookRequest, wait_for_response: bool) -> DispatchResult {
        let summary = RequestSummary::from(&request);
        let http_request = match request.to_http() {
            Ok(r) => r,
            Err(error) if !wait_for_response && error.kind == ErrorKind::Network => {
                tracing::warn!(method = %summary.method, url = %summary.url, %error, "background webhook failed");
                return DispatchResult::Accepted { message: ACCEPTED_MESSAGE.to_string(), webhook_request: summary };
            }
            Err(error) => {
                tracing::info!(method = %summary.method, url = %summary.url, %error, "cannot build webhook request");
                return DispatchResult::Error { error, webhook_request: summary };
            }
        };

        if !wait_for_response {
            let (service, timeout) = (self.service.clone(), self.timeout);
            let (method, url) = (summary.method.clone(), summary.url.clone());
            tokio::spawn(async move {
                match service.oneshot(http_request).await {
                    Ok(response) => tracing::info!(%method, %url, status = %response.status(), "background webhook sent"),
                    Err(e) => {
                        let error = DispatchError::transport(e, timeout);
                        tracing::warn!(%method, %url, %error, "background webhook failed")
                    }
                }
            });
            return DispatchResult::Accepted { message: ACCEPTED_MESSAGE.to_string(), webhook_request: summary };
        }

        tracing::info!(method = %summary.method, url = %summary.url, "send webhook");
        match self.service.clone().oneshot(http_request).await {
            Ok(response) => {
                let webhook_response = WebhookResponse::from(response);
                tracing::info!(method = %summary.method, url = %summary.url, status = %webhook_response.status_code, "webhook responded");
                let WebhookRequest { url, headers, body, .. } = request;
                let webhook_request =
                    EchoedRequest { method: summary.method, url, headers: self.redact.redact(&headers), body };
                DispatchResult::Success { webhook_request, webhook_response }
            }
            Err(e) => {
                let error = DispatchError::transport(e, self.timeout);
                tracing::info!(method = %summary.method, url = %summary.url, %error, "webhook failed");
                DispatchResult::Error { error, webhook_request: summary }
            }
        }
    }
}
