//! Login against PostgreSQL roles and the role-based permission map.
//!
//! Application users are database login roles. A login succeeds when the
//! database accepts the credentials and the role is, or belongs to, one of the
//! three application roles. What each role may do is decided by [`permits`].

use crate::error::ServiceError;
use chrono::{DateTime, Duration, Utc};
use configuration::DatabaseSettings;
use core_types::{AuditAction, NewAuditEntry, Operation, Resource, Role};
use database::{DbError, DbRepository, connect_as, disconnect, identity_on};
use serde::Serialize;
use uuid::Uuid;

/// Whether `role` may perform `operation` on `resource`.
pub fn permits(role: Role, operation: Operation, resource: Resource) -> bool {
    use Operation::*;
    use Resource::*;

    match role {
        Role::Admin => match resource {
            Clients | Bookings | Courts | Payments | Users => true,
            Reports | Audit => operation == Read,
        },
        Role::Operator => match resource {
            Clients | Bookings | Payments => matches!(operation, Create | Read | Update),
            Courts | Reports | Users | Audit => operation == Read,
        },
        Role::Viewer => operation == Read,
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub role: Role,
    /// Every PostgreSQL role the user belongs to, for display.
    pub member_of: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn can(&self, operation: Operation, resource: Resource) -> bool {
        permits(self.role, operation, resource)
    }

    /// `Forbidden` unless the session's role allows the operation.
    pub fn require(&self, operation: Operation, resource: Resource) -> Result<(), ServiceError> {
        if self.can(operation, resource) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role '{}' cannot {} {}",
                self.role, operation, resource
            )))
        }
    }
}

/// Picks the application role for a login: the login role itself when it is one
/// of the application roles, otherwise the most privileged one it belongs to.
pub fn resolve_role(login: &str, member_of: &[String]) -> Option<Role> {
    if let Some(role) = Role::from_pg_role(login) {
        return Some(role);
    }
    Role::ALL
        .into_iter()
        .find(|role| member_of.iter().any(|name| name == role.pg_role()))
}

#[derive(Debug, Clone)]
pub struct AuthManager {
    repo: DbRepository,
    settings: DatabaseSettings,
    session_ttl: Duration,
}

impl AuthManager {
    pub fn new(repo: DbRepository, settings: DatabaseSettings, session_ttl_minutes: i64) -> Self {
        Self {
            repo,
            settings,
            session_ttl: Duration::minutes(session_ttl_minutes),
        }
    }

    /// Verifies the credentials by connecting as the user, then maps the role.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Unauthorized("username and password are required".into()));
        }

        let mut conn = match connect_as(&self.settings, username, password).await {
            Ok(conn) => conn,
            Err(DbError::ConnectionError(err)) if err.as_database_error().is_some() => {
                self.audit_failed_login(username, "invalid credentials").await;
                return Err(ServiceError::Unauthorized("invalid username or password".into()));
            }
            Err(err) => return Err(err.into()),
        };
        let identity = identity_on(&mut conn).await;
        disconnect(conn).await;
        let login = identity?.current_user;

        let member_of: Vec<String> = self
            .repo
            .roles_of(&login)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();
        let Some(role) = resolve_role(&login, &member_of) else {
            self.audit_failed_login(&login, "role not allowed").await;
            return Err(ServiceError::Forbidden(format!(
                "user '{}' has no application role",
                login
            )));
        };

        self.repo.record_login(&login, role.pg_role()).await?;
        self.repo
            .record_audit(
                &NewAuditEntry::success(&login, AuditAction::Login, "usuarios")
                    .details(format!("role {}", role)),
            )
            .await?;

        let now = Utc::now();
        tracing::info!(user = %login, %role, "User logged in.");
        Ok(Session {
            token: Uuid::new_v4(),
            username: login,
            role,
            member_of,
            created_at: now,
            expires_at: now + self.session_ttl,
        })
    }

    pub async fn logout(&self, session: &Session) -> Result<(), ServiceError> {
        self.repo
            .record_audit(&NewAuditEntry::success(&session.username, AuditAction::Logout, "usuarios"))
            .await?;
        tracing::info!(user = %session.username, "User logged out.");
        Ok(())
    }

    // A failed audit write must not hide the login error itself.
    async fn audit_failed_login(&self, username: &str, reason: &str) {
        let entry = NewAuditEntry::success(username, AuditAction::Login, "usuarios")
            .details(reason)
            .failed();
        if let Err(e) = self.repo.record_audit(&entry).await {
            tracing::error!(error = %e, "Failed to audit login attempt.");
        }
        tracing::warn!(user = %username, reason, "Login rejected.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_manages_data_but_only_reads_reports_and_audit() {
        for resource in [Resource::Clients, Resource::Bookings, Resource::Courts, Resource::Payments, Resource::Users] {
            for op in Operation::ALL {
                assert!(permits(Role::Admin, op, resource), "admin {op} {resource}");
            }
        }
        for resource in [Resource::Reports, Resource::Audit] {
            assert!(permits(Role::Admin, Operation::Read, resource));
            assert!(!permits(Role::Admin, Operation::Delete, resource));
            assert!(!permits(Role::Admin, Operation::Create, resource));
        }
    }

    #[test]
    fn operator_cannot_delete_or_touch_courts() {
        for resource in [Resource::Clients, Resource::Bookings, Resource::Payments] {
            assert!(permits(Role::Operator, Operation::Create, resource));
            assert!(permits(Role::Operator, Operation::Update, resource));
            assert!(!permits(Role::Operator, Operation::Delete, resource));
        }
        assert!(permits(Role::Operator, Operation::Read, Resource::Courts));
        assert!(!permits(Role::Operator, Operation::Update, Resource::Courts));
        assert!(!permits(Role::Operator, Operation::Create, Resource::Users));
    }

    #[test]
    fn viewer_only_reads() {
        for resource in Resource::ALL {
            assert!(permits(Role::Viewer, Operation::Read, resource));
            for op in [Operation::Create, Operation::Update, Operation::Delete] {
                assert!(!permits(Role::Viewer, op, resource));
            }
        }
    }

    #[test]
    fn role_resolution_prefers_direct_then_most_privileged() {
        assert_eq!(resolve_role("admin_reservas", &[]), Some(Role::Admin));
        let groups = vec!["consultor_reservas".to_string(), "operador_reservas".to_string()];
        assert_eq!(resolve_role("maria", &groups), Some(Role::Operator));
        assert_eq!(resolve_role("intruder", &["pg_read_all_data".to_string()]), None);
    }

    #[test]
    fn session_expiry_and_require() {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            username: "maria".into(),
            role: Role::Viewer,
            member_of: vec![],
            created_at: now,
            expires_at: now + Duration::minutes(5),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::minutes(5)));
        assert!(session.require(Operation::Read, Resource::Bookings).is_ok());
        assert!(matches!(
            session.require(Operation::Delete, Resource::Bookings),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
