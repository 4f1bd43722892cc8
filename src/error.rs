use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::directory::DirectoryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponseBody {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            AppError::Directory(DirectoryError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DIRECTORY_UNAVAILABLE")
            }
            AppError::Directory(DirectoryError::BindRejected) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_BIND_FAILED")
            }
            AppError::Directory(DirectoryError::Query(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_ERROR")
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };

        // Request-scoped failures are logged and answered, never fatal.
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }

        let body = ErrorResponseBody {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
