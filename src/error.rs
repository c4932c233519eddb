//! Error types for the contract highlights server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::annotations::AnnotationError;
use crate::export::ExportError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Annotation(e) => match e {
                AnnotationError::HighlightNotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
                AnnotationError::UnknownCategory(_) => {
                    (StatusCode::NOT_FOUND, "unknown_category", e.to_string())
                }
                AnnotationError::DefaultCategory(_) => {
                    (StatusCode::CONFLICT, "default_category", e.to_string())
                }
                AnnotationError::EmptySelection { .. } => {
                    (StatusCode::BAD_REQUEST, "empty_selection", e.to_string())
                }
                AnnotationError::InvalidCategoryName(_) | AnnotationError::InvalidColor(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
            },
            AppError::Export(e) => match e {
                ExportError::Empty => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "nothing_to_export",
                    e.to_string(),
                ),
            },
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Storage error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
