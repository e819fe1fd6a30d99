use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bluebridge_core::STATUS_ERROR;
use schemars::JsonSchema;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    #[error("bad_request: {0}")]
    BadRequest(&'static str),
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),
    #[error("conflict: {0}")]
    Conflict(&'static str),
    #[error("not_found: {0}")]
    NotFound(&'static str),
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("db_error")]
    DbError,
    #[error("internal: {0}")]
    Internal(&'static str),
}

impl ServiceError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::DbError | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the error envelope. Internal details never leave the server.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Conflict(message)
            | Self::NotFound(message) => (*message).to_string(),
            Self::Upstream(message) => message.clone(),
            Self::DbError | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
        }
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

pub fn map_service_error(error: ServiceError) -> Response {
    error_response(error.status_code(), error.message())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        map_service_error(self)
    }
}
