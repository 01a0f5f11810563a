use crate::{AppState, auth::CurrentSession, error::AppError};
use availability::TimeRange;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use core_types::{Booking, Court, CourtStatus, CourtType, NewCourt, NewCourtType, Operation, Resource};
use database::CourtStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct CourtListQuery {
    pub sport: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: CourtStatus,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Serialize)]
pub struct FreeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// # GET /api/courts?sport=&q=
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<CourtListQuery>,
) -> Result<Json<Vec<Court>>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    let courts = match (query.sport.as_deref(), query.q.as_deref()) {
        (Some(sport), _) => state.services.courts.by_sport(sport).await?,
        (None, Some(term)) => state.services.courts.search(term).await?,
        (None, None) => state.services.courts.list().await?,
    };
    Ok(Json(courts))
}

/// # GET /api/courts/active
pub async fn active(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Court>>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    Ok(Json(state.services.courts.list_active().await?))
}

/// # GET /api/courts/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<CourtStats>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    Ok(Json(state.services.courts.stats().await?))
}

/// # GET /api/courts/available?date=&start=&end=
pub async fn available(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<Court>>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    let requested = TimeRange::new(query.start, query.end)?;
    Ok(Json(state.services.courts.available(query.date, requested).await?))
}

/// # POST /api/courts
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(court): Json<NewCourt>,
) -> Result<(StatusCode, Json<Court>), AppError> {
    session.require(Operation::Create, Resource::Courts)?;
    let created = state.services.courts.create(&court, &session.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/courts/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Court>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    Ok(Json(state.services.courts.get(id).await?))
}

/// # PUT /api/courts/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(court): Json<NewCourt>,
) -> Result<Json<Court>, AppError> {
    session.require(Operation::Update, Resource::Courts)?;
    Ok(Json(state.services.courts.update(id, &court, &session.username).await?))
}

/// # PUT /api/courts/:id/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Court>, AppError> {
    session.require(Operation::Update, Resource::Courts)?;
    Ok(Json(
        state.services.courts.set_status(id, body.status, &session.username).await?,
    ))
}

/// # DELETE /api/courts/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    session.require(Operation::Delete, Resource::Courts)?;
    state.services.courts.delete(id, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/courts/:id/slots?date=
pub async fn slots(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Vec<FreeSlot>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    let slots = state
        .services
        .bookings
        .free_slots(id, query.date)
        .await?
        .into_iter()
        .map(|r| FreeSlot { start: r.start(), end: r.end() })
        .collect();
    Ok(Json(slots))
}

/// # GET /api/courts/:id/bookings
pub async fn bookings(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.for_court(id).await?))
}

// --- Court types ---

/// # GET /api/court-types
pub async fn list_types(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<CourtType>>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    Ok(Json(state.services.courts.list_types().await?))
}

/// # POST /api/court-types
pub async fn create_type(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(court_type): Json<NewCourtType>,
) -> Result<(StatusCode, Json<CourtType>), AppError> {
    session.require(Operation::Create, Resource::Courts)?;
    let created = state.services.courts.create_type(&court_type, &session.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/court-types/:id
pub async fn get_type(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<CourtType>, AppError> {
    session.require(Operation::Read, Resource::Courts)?;
    Ok(Json(state.services.courts.get_type(id).await?))
}

/// # PUT /api/court-types/:id
pub async fn update_type(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(court_type): Json<NewCourtType>,
) -> Result<Json<CourtType>, AppError> {
    session.require(Operation::Update, Resource::Courts)?;
    Ok(Json(
        state.services.courts.update_type(id, &court_type, &session.username).await?,
    ))
}

/// # DELETE /api/court-types/:id
pub async fn delete_type(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    session.require(Operation::Delete, Resource::Courts)?;
    state.services.courts.delete_type(id, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
