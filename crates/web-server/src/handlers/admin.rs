//! Audit trail, database users and table maintenance.

use super::RangeQuery;
use crate::{AppState, auth::CurrentSession, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use core_types::{
    AuditAction, AuditEntry, MaintainedTable, MaintenanceMode, Operation, Page, PageRequest, Resource,
};
use database::{AuditStat, DbIdentity, RoleMembership, RoleStat, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use services::Session;
use std::sync::Arc;

// --- Audit ---

/// # GET /api/audit?page=&limit=
pub async fn audit_list(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<AuditEntry>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    Ok(Json(state.repo.list_audit(page).await?))
}

/// # GET /api/audit/between?from=&to=
pub async fn audit_between(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    Ok(Json(state.repo.audit_between(range.into()).await?))
}

/// # GET /api/audit/actor/:actor
pub async fn audit_by_actor(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(actor): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    Ok(Json(state.repo.audit_by_actor(&actor).await?))
}

/// # GET /api/audit/table/:table
pub async fn audit_by_table(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(table): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    Ok(Json(state.repo.audit_by_table(&table).await?))
}

/// # GET /api/audit/action/:action
pub async fn audit_by_action(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(action): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    let action: AuditAction = action.parse()?;
    Ok(Json(state.repo.audit_by_action(action).await?))
}

/// # GET /api/audit/stats
pub async fn audit_stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<AuditStat>>, AppError> {
    session.require(Operation::Read, Resource::Audit)?;
    Ok(Json(state.repo.audit_stats().await?))
}

// --- Users ---

/// # GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    session.require(Operation::Read, Resource::Users)?;
    Ok(Json(state.repo.list_users().await?))
}

#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub database: DbIdentity,
    pub session: Session,
}

/// # GET /api/users/me
///
/// The pool's own database identity alongside the caller's session.
pub async fn identity(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<IdentityResponse>, AppError> {
    let database = state.repo.current_identity().await?;
    Ok(Json(IdentityResponse { database, session }))
}

/// # GET /api/users/:username/roles
pub async fn roles_of(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(username): Path<String>,
) -> Result<Json<Vec<RoleMembership>>, AppError> {
    session.require(Operation::Read, Resource::Users)?;
    Ok(Json(state.repo.roles_of(&username).await?))
}

/// # GET /api/roles/:role/members
pub async fn users_in_role(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(role): Path<String>,
) -> Result<Json<Vec<RoleMembership>>, AppError> {
    session.require(Operation::Read, Resource::Users)?;
    Ok(Json(state.repo.users_in_role(&role).await?))
}

/// # GET /api/roles/stats
pub async fn role_stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<RoleStat>, AppError> {
    session.require(Operation::Read, Resource::Users)?;
    Ok(Json(state.repo.role_stats().await?))
}

// --- Maintenance ---

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub mode: MaintenanceMode,
    /// Every maintained table when absent.
    pub table: Option<MaintainedTable>,
}

/// # POST /api/maintenance
///
/// Requires the operation matching the mode on every table it touches.
pub async fn maintain(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<MaintenanceRequest>,
) -> Result<Json<Value>, AppError> {
    let operation = request.mode.operation();
    match request.table {
        Some(table) => {
            session.require(operation, table.resource())?;
            let outcome = state
                .services
                .maintenance
                .run(table, request.mode, &session.username)
                .await?;
            let key = table.as_str();
            Ok(Json(json!({ key: { "status": "ok", "result": outcome } })))
        }
        None => {
            for table in MaintainedTable::ALL {
                session.require(operation, table.resource())?;
            }
            let outcomes = state
                .services
                .maintenance
                .run_all(request.mode, &session.username)
                .await;
            Ok(Json(json!(outcomes)))
        }
    }
}
