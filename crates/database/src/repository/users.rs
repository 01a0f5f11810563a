use super::DbRepository;
use crate::DbError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

/// Who a connection is running as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DbIdentity {
    pub current_user: String,
    pub session_user: String,
    pub database: String,
    pub version: String,
}

/// A PostgreSQL role, as seen from a membership relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RoleMembership {
    pub name: String,
    pub can_login: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RoleStat {
    pub total_roles: i64,
    pub login_roles: i64,
    pub superusers: i64,
}

/// Represents a row from the `usuarios` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

const IDENTITY_SQL: &str = "SELECT current_user::text AS current_user, \
    session_user::text AS session_user, current_database()::text AS database, \
    version() AS version";

/// Identity of an arbitrary connection, e.g. one opened with a user's own credentials.
pub async fn identity_on(conn: &mut PgConnection) -> Result<DbIdentity, DbError> {
    let identity = sqlx::query_as::<_, DbIdentity>(IDENTITY_SQL)
        .fetch_one(conn)
        .await?;
    Ok(identity)
}

impl DbRepository {
    /// Identity of the service account behind the pool.
    pub async fn current_identity(&self) -> Result<DbIdentity, DbError> {
        let mut conn = self.pool.acquire().await?;
        identity_on(&mut conn).await
    }

    /// Every role `username` belongs to, directly or through intermediate groups.
    pub async fn roles_of(&self, username: &str) -> Result<Vec<RoleMembership>, DbError> {
        let roles = sqlx::query_as::<_, RoleMembership>(
            r#"
            WITH RECURSIVE granted(oid) AS (
                SELECT m.roleid
                FROM pg_auth_members m
                JOIN pg_roles u ON u.oid = m.member
                WHERE u.rolname = $1
                UNION
                SELECT m.roleid
                FROM pg_auth_members m
                JOIN granted g ON m.member = g.oid
            )
            SELECT r.rolname::text AS name, r.rolcanlogin AS can_login
            FROM pg_roles r
            JOIN granted g ON g.oid = r.oid
            ORDER BY r.rolname
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Direct members of `role`.
    pub async fn users_in_role(&self, role: &str) -> Result<Vec<RoleMembership>, DbError> {
        let users = sqlx::query_as::<_, RoleMembership>(
            r#"
            SELECT u.rolname::text AS name, u.rolcanlogin AS can_login
            FROM pg_roles u
            JOIN pg_auth_members m ON m.member = u.oid
            JOIN pg_roles r ON r.oid = m.roleid
            WHERE r.rolname = $1
            ORDER BY u.rolname
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn role_stats(&self) -> Result<RoleStat, DbError> {
        let stats = sqlx::query_as::<_, RoleStat>(
            r#"
            SELECT
                COUNT(*) AS total_roles,
                COUNT(*) FILTER (WHERE rolcanlogin) AS login_roles,
                COUNT(*) FILTER (WHERE rolsuper) AS superusers
            FROM pg_roles
            WHERE rolname NOT LIKE 'pg\_%'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, DbError> {
        let users = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, rol AS role, activo AS active,
                   fecha_creacion AS created_at, ultimo_acceso AS last_login
            FROM usuarios
            ORDER BY username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Creates or refreshes the profile of a user who just logged in.
    pub async fn record_login(&self, username: &str, role: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO usuarios (username, rol, ultimo_acceso)
            VALUES ($1, $2, NOW())
            ON CONFLICT (username) DO UPDATE SET rol = EXCLUDED.rol, ultimo_acceso = NOW()
            "#,
        )
        .bind(username)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
