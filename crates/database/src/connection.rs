use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgConnection, PgPool};
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The pool uses the service account from `settings.url` and is shared across the
/// entire application. Pool size and acquire timeout come from the configuration.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    if settings.url.trim().is_empty() {
        return Err(DbError::ConnectionConfigError(
            "DATABASE_URL must be set.".to_string(),
        ));
    }

    let options: PgConnectOptions = settings
        .url
        .parse::<PgConnectOptions>()
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?
        .application_name(&settings.application_name);

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    tracing::info!(
        max_connections = settings.max_connections,
        "Database connection pool established."
    );
    Ok(pool)
}

/// Builds the pool without opening any connection yet. Connections are made on
/// first use, so the caller starts even while the database is unreachable.
pub fn connect_lazy(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let options: PgConnectOptions = settings
        .url
        .parse::<PgConnectOptions>()
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?
        .application_name(&settings.application_name);

    Ok(PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect_lazy_with(options))
}

/// Opens a single connection authenticated as `user`.
///
/// Application users are PostgreSQL roles, so a successful connection is the
/// password check. The caller is expected to close the connection promptly.
pub async fn connect_as(
    settings: &DatabaseSettings,
    user: &str,
    password: &str,
) -> Result<PgConnection, DbError> {
    let options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .database(&settings.name)
        .username(user)
        .password(password)
        .application_name(&settings.application_name);

    let connect = options.connect();
    let conn = tokio::time::timeout(Duration::from_secs(settings.connect_timeout_secs), connect)
        .await
        .map_err(|_| DbError::ConnectionConfigError(format!(
            "timed out connecting to {}:{} as {}",
            settings.host, settings.port, user
        )))??;
    Ok(conn)
}

/// Closes a connection opened with `connect_as`, logging instead of failing.
pub async fn disconnect(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Error while closing login connection.");
    }
}

/// A utility function to run database migrations automatically.
///
/// Applied on server start so the schema is always up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Round-trips a trivial query. Used by the health endpoint.
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    conn.ping().await?;
    Ok(())
}
