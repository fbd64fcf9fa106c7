use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::core::DbError;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

/// An engine error bound to the request path it occurred on.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    path: String,
}

impl ApiError {
    pub fn new(err: DbError, path: &str) -> Self {
        let (status, message) = if err.is_validation() {
            (StatusCode::BAD_REQUEST, err.to_string())
        } else {
            match &err {
                DbError::TableNotFound(_) | DbError::RowNotFound(_, _) => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                DbError::DuplicateTable(_) => (StatusCode::CONFLICT, err.to_string()),
                _ => {
                    // StorageFailure and anything unforeseen: full context
                    // in the log, a generic message on the wire.
                    error!(error = %err, path, "request failed in storage");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal storage failure".to_string(),
                    )
                }
            }
        };

        Self {
            status,
            message,
            path: path.to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            path: path.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = ErrorBody {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.message,
            path: self.path,
        };

        (status, Json(body)).into_response()
    }
}
