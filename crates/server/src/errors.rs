use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Errors a handler can return; each renders as a `{detail: ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A body field broke a constraint (422).
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    /// The body could not be read as JSON of the expected shape.
    #[error("{message}")]
    Malformed { status: StatusCode, location: &'static str, message: String },
    /// The tabular store failed; `context` prefixes the cause (500).
    #[error("{context}: {reason}")]
    Storage { context: &'static str, reason: String },
}

impl ApiError {
    pub fn from_service(e: ServiceError, context: &'static str) -> Self {
        match e {
            ServiceError::Validation { field, message } => {
                ApiError::Validation { field: field.to_string(), message }
            }
            ServiceError::Storage(cause) => ApiError::Storage { context, reason: cause.to_string() },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Malformed { status, .. } => *status,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed { status: rejection.status(), location: "body", message: rejection.body_text() }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed { status: rejection.status(), location: "query", message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { field, message } => json!({
                "detail": [{"loc": ["body", field], "msg": message, "type": "value_error"}]
            }),
            ApiError::Malformed { location, message, .. } => json!({
                "detail": [{"loc": [location], "msg": message, "type": "request_error"}]
            }),
            ApiError::Storage { .. } => {
                error!(error = %self, "storage failure");
                json!({"detail": self.to_string()})
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
