use thiserror::Error;

// SQLSTATE codes the repository translates into domain errors.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    ConnectionError(sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested {0} was not found in the database.")]
    NotFound(String),

    /// The write collides with existing data: an overlapping booking, a duplicate
    /// unique value, or a row that is still referenced.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid data: {0}")]
    Invalid(String),
}

impl DbError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        DbError::NotFound(format!("{} {}", what, id))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return DbError::NotFound("row".to_string());
        }
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => {
                    return DbError::Conflict(
                        "the court is already booked for an overlapping time".to_string(),
                    );
                }
                Some(UNIQUE_VIOLATION) => {
                    return DbError::Conflict(format!("duplicate value violates {}", constraint));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return DbError::Conflict(format!(
                        "referenced row is missing or still in use ({})",
                        constraint
                    ));
                }
                Some(CHECK_VIOLATION) => {
                    return DbError::Invalid(format!("check constraint {} failed", constraint));
                }
                _ => {}
            }
        }
        DbError::ConnectionError(err)
    }
}
