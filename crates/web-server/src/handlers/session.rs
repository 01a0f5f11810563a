use crate::{AppState, auth::CurrentSession, error::AppError};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use core_types::Role;
use serde::{Deserialize, Serialize};
use serde_json::json;
use services::Session;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub username: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// # POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;
    let response = LoginResponse {
        token: session.token,
        username: session.username.clone(),
        role: session.role,
        expires_at: session.expires_at,
    };
    state.sessions.insert(session).await;
    Ok(Json(response))
}

/// # POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(&session.token).await;
    state.services.auth.logout(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/session
pub async fn current(CurrentSession(session): CurrentSession) -> Json<Session> {
    Json(session)
}

/// # GET /api/health
/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match database::ping(state.repo.pool()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}
