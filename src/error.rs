//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate resource key: {0}")]
    DuplicateKey(String),
    #[error("invalid resource key or endpoint: '{0}'")]
    InvalidKey(String),
    #[error("config load: {0}")]
    Load(String),
}

/// Failures below HTTP: the backend could not be reached or its answer could not be read.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("backend request timed out")]
    Timeout,
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("undecodable backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() || e.is_body() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Unreachable(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Backend rejected the payload; body holds its field errors untouched.
    #[error("validation failed")]
    ValidationFailed(Value),
    #[error("backend responded with {status}")]
    Backend { status: u16, body: Value },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Classify a non-2xx backend answer for a read path.
    pub fn from_backend(status: u16, body: Value, what: &str) -> Self {
        match status {
            404 => AppError::NotFound(what.to_string()),
            400 => AppError::ValidationFailed(body),
            _ => AppError::Backend { status, body },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::UnknownResource(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationFailed(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(TransportError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::UnknownResource(_) => "unknown_resource",
            AppError::NotFound(_) => "not_found",
            AppError::ValidationFailed(_) => "validation_error",
            AppError::Backend { .. } => "backend_error",
            AppError::Transport(_) => "transport_error",
            AppError::BadRequest(_) => "bad_request",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();
        let details = match self {
            AppError::ValidationFailed(body) => Some(body),
            AppError::Backend { body, .. } => Some(body),
            _ => None,
        };
        (status, Json(crate::response::error_body(code, message, details))).into_response()
    }
}
