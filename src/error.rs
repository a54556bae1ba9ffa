//! Error types for the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::DocumentError;
use crate::password::PatternError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn document_status(err: &DocumentError) -> StatusCode {
    match err {
        DocumentError::FileNotFound(_) | DocumentError::NotLoaded(_) => StatusCode::NOT_FOUND,
        DocumentError::InvalidPassword(_) => StatusCode::UNAUTHORIZED,
        DocumentError::UnsupportedFormat(_)
        | DocumentError::UnsupportedEncryption(_)
        | DocumentError::NotEncrypted(_)
        | DocumentError::Pattern(_) => StatusCode::BAD_REQUEST,
        DocumentError::ParseFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DocumentError::HandleMismatch { .. }
        | DocumentError::IoError(_)
        | DocumentError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Pattern(e) => (StatusCode::BAD_REQUEST, "invalid_pattern", e.to_string()),
            AppError::Document(e) => {
                let status = document_status(e);
                if status.is_server_error() {
                    tracing::error!("Document error: {}", e);
                } else {
                    tracing::debug!("Document request failed: {}", e);
                }
                (status, e.kind(), e.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(format!("{:?}", self))
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_status_codes() {
        let cases = [
            (DocumentError::FileNotFound("a".into()), StatusCode::NOT_FOUND),
            (DocumentError::NotLoaded("a".into()), StatusCode::NOT_FOUND),
            (DocumentError::InvalidPassword("a".into()), StatusCode::UNAUTHORIZED),
            (DocumentError::UnsupportedFormat("a".into()), StatusCode::BAD_REQUEST),
            (DocumentError::NotEncrypted("a".into()), StatusCode::BAD_REQUEST),
            (DocumentError::ParseFailure("a".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DocumentError::Timeout(30), StatusCode::GATEWAY_TIMEOUT),
            (DocumentError::TaskError("a".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
