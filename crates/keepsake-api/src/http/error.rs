//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use keepsake_types::error::SessionError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session lifecycle errors.
    Session(SessionError),
    /// No primer compiled for the requested handle.
    PrimerNotFound(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Session(SessionError::NotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Session not found".to_string(),
            ),
            AppError::Session(SessionError::AlreadyCompleted) => (
                StatusCode::CONFLICT,
                "SESSION_COMPLETED",
                "Session is already completed".to_string(),
            ),
            AppError::Session(SessionError::ReservedHandle(handle)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("'{handle}' is a reserved handle"),
            ),
            AppError::Session(SessionError::StorageError(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                msg.clone(),
            ),
            AppError::PrimerNotFound(handle) => (
                StatusCode::NOT_FOUND,
                "PRIMER_NOT_FOUND",
                format!("No primer compiled for '{handle}'"),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_not_found_maps_to_404() {
        let resp = AppError::Session(SessionError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_already_completed_maps_to_409() {
        let resp = AppError::Session(SessionError::AlreadyCompleted).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_reserved_handle_maps_to_400() {
        let resp =
            AppError::Session(SessionError::ReservedHandle("unassigned".to_string()))
                .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
