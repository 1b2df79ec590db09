use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower::BoxError;

use crate::{
    dispatch::{DispatchError, DispatchResult},
    error::{RegistryError, TriggerError},
};

/// Error answered as `{"msg": ..., "detail": ...}`, where `msg` follows the status.
#[derive(Error, Debug)]
#[error("{status}: {source}")]
pub struct AppError<T> {
    #[source]
    pub source: BoxError,
    pub status: StatusCode,
    pub detail: T,
}
impl<T> AppError<T> {
    pub fn new<E: Into<BoxError>>(status: StatusCode, source: E, detail: T) -> Self {
        Self { source: source.into(), status, detail }
    }
}
impl AppError<String> {
    pub fn displayed<E: std::error::Error + Send + Sync + 'static>(status: StatusCode, source: E) -> Self {
        let detail = source.to_string();
        Self::new(status, source, detail)
    }
}
impl<T: Serialize> IntoResponse for AppError<T> {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = %self.status, "{}", self.source);
        } else {
            tracing::debug!(status = %self.status, "{}", self.source);
        }
        let body = ErrorBody { msg: message(self.status).to_string(), detail: self.detail };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody<T> {
    pub msg: String,
    pub detail: T,
}

pub fn message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "not found",
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::SERVICE_UNAVAILABLE => "webhook target is unavailable",
        s => s.canonical_reason().unwrap_or("error"),
    }
}

#[derive(Error, Debug, Clone)]
#[error("no route for `{0}`")]
pub struct NoRoute(pub Uri);
impl IntoResponse for NoRoute {
    fn into_response(self) -> Response {
        let detail = self.0.to_string();
        AppError::new(StatusCode::NOT_FOUND, self, detail).into_response()
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        match self {
            RegistryError::TemplateNotFound(_) => AppError::displayed(StatusCode::NOT_FOUND, self).into_response(),
        }
    }
}

impl IntoResponse for TriggerError {
    fn into_response(self) -> Response {
        AppError::displayed(self.status_code(), self).into_response()
    }
}

/// A dispatch that resolved as [`DispatchResult::Error`], answered with the whole result as detail.
#[derive(Error, Debug, Clone)]
#[error("{error}")]
pub struct DispatchFailed {
    pub error: DispatchError,
    pub result: DispatchResult,
}
impl IntoResponse for DispatchFailed {
    fn into_response(self) -> Response {
        let Self { error, result } = self;
        AppError::new(error.kind.status_code(), error, result).into_response()
    }
}
