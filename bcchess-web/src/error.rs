use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chess_session::SessionError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Invalid { field: &'static str, message: String },
    Conflict(String),
    Internal(String),
    Database(sqlx::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::Invalid { field, message } => write!(f, "Invalid {field}: {message}"),
            AppError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
            AppError::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Errors are returned as `{"message": ...}`, plus `"field"` for
/// validation failures tied to one request field.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"message": msg})),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"message": msg})),
            AppError::Invalid { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({"message": message, "field": field}),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({"message": msg})),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"message": "Internal server error"}),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"message": "Internal server error"}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotPlaying | SessionError::MatchInProgress => {
                AppError::Conflict(e.to_string())
            }
            SessionError::InvalidPgn { .. } => AppError::Internal(e.to_string()),
            SessionError::InvalidMove(_)
            | SessionError::IllegalMove(_)
            | SessionError::NothingToUndo => AppError::BadRequest(e.to_string()),
        }
    }
}
