use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl From<core_types::CoreError> for AppError {
    fn from(err: core_types::CoreError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<availability::AvailabilityError> for AppError {
    fn from(err: availability::AvailabilityError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Service(err) => match err {
                ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                ServiceError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
                ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg),
                ServiceError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
                ServiceError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
                ServiceError::Database(db_err) => {
                    tracing::error!(error = ?db_err, "Database error.");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal database error occurred".to_string(),
                    )
                }
            },
            AppError::Database(db_err) => return AppError::Service(db_err.into()).into_response(),
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A server configuration error occurred".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
