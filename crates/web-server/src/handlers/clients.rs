use super::SearchQuery;
use crate::{AppState, auth::CurrentSession, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::{Booking, Client, ClientUpdate, NewClient, Operation, Page, PageRequest, Payment, Resource};
use database::ClientStats;
use std::sync::Arc;

/// # GET /api/clients?page=&limit=
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Client>>, AppError> {
    session.require(Operation::Read, Resource::Clients)?;
    Ok(Json(state.services.clients.list(page).await?))
}

/// # GET /api/clients/active
pub async fn active(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Client>>, AppError> {
    session.require(Operation::Read, Resource::Clients)?;
    Ok(Json(state.services.clients.list_active().await?))
}

/// # GET /api/clients/search?q=
pub async fn search(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    session.require(Operation::Read, Resource::Clients)?;
    Ok(Json(state.services.clients.search(&query.q).await?))
}

/// # GET /api/clients/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ClientStats>, AppError> {
    session.require(Operation::Read, Resource::Clients)?;
    Ok(Json(state.services.clients.stats().await?))
}

/// # POST /api/clients
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(client): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    session.require(Operation::Create, Resource::Clients)?;
    let created = state.services.clients.create(&client, &session.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/clients/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Client>, AppError> {
    session.require(Operation::Read, Resource::Clients)?;
    Ok(Json(state.services.clients.get(id).await?))
}

/// # PUT /api/clients/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(update): Json<ClientUpdate>,
) -> Result<Json<Client>, AppError> {
    session.require(Operation::Update, Resource::Clients)?;
    Ok(Json(state.services.clients.update(id, &update, &session.username).await?))
}

/// # DELETE /api/clients/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    session.require(Operation::Delete, Resource::Clients)?;
    state.services.clients.delete(id, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/clients/:id/bookings
pub async fn bookings(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.for_client(id).await?))
}

/// # GET /api/clients/:id/payments
pub async fn payments(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Payment>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.for_client(id).await?))
}
