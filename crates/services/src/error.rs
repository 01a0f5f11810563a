use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ServiceError::NotFound(what),
            DbError::Conflict(msg) => ServiceError::Conflict(msg),
            DbError::Invalid(msg) => ServiceError::Validation(msg),
            other => ServiceError::Database(other),
        }
    }
}

impl From<core_types::CoreError> for ServiceError {
    fn from(err: core_types::CoreError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<availability::AvailabilityError> for ServiceError {
    fn from(err: availability::AvailabilityError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
