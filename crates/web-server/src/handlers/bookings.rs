use super::{LimitQuery, RangeQuery};
use crate::{AppState, auth::CurrentSession, error::AppError};
use availability::TimeRange;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use core_types::{
    Booking, BookingStatus, BookingUpdate, NewBooking, Operation, Page, PageRequest, Payment, Resource,
};
use database::BookingFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use services::{AvailabilityReport, BookingStats};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub court_id: i32,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// The booking being edited, which must not conflict with itself.
    pub exclude: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PurgeBody {
    pub before: NaiveDate,
}

/// # GET /api/bookings?page=&limit=
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.list(page).await?))
}

/// # GET /api/bookings/active
pub async fn active(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.active().await?))
}

/// # GET /api/bookings/recent?limit=
pub async fn recent(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.recent(query.limit).await?))
}

/// # GET /api/bookings/day/:date
pub async fn on_day(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.on(date).await?))
}

/// # GET /api/bookings/filter?from=&to=&status=&court_id=&client_id=
pub async fn filter(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(filter): Query<BookingFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.filter(&filter).await?))
}

/// # GET /api/bookings/availability?court_id=&date=&start=&end=&exclude=
pub async fn availability(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    let requested = TimeRange::new(query.start, query.end)?;
    let report = state
        .services
        .bookings
        .check_availability(query.court_id, query.date, requested, query.exclude)
        .await?;
    Ok(Json(report))
}

/// # GET /api/bookings/stats?from=&to=
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<BookingStats>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.stats(range.into()).await?))
}

/// # GET /api/bookings/unpaid
pub async fn unpaid(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Booking>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.unpaid_bookings().await?))
}

/// # POST /api/bookings
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(booking): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    session.require(Operation::Create, Resource::Bookings)?;
    let created = state.services.bookings.create(&booking, &session.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/bookings/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Booking>, AppError> {
    session.require(Operation::Read, Resource::Bookings)?;
    Ok(Json(state.services.bookings.get(id).await?))
}

/// # PUT /api/bookings/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(update): Json<BookingUpdate>,
) -> Result<Json<Booking>, AppError> {
    session.require(Operation::Update, Resource::Bookings)?;
    Ok(Json(state.services.bookings.update(id, &update, &session.username).await?))
}

/// # PUT /api/bookings/:id/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Booking>, AppError> {
    session.require(Operation::Update, Resource::Bookings)?;
    Ok(Json(
        state.services.bookings.change_status(id, body.status, &session.username).await?,
    ))
}

/// # POST /api/bookings/:id/cancel
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<Booking>, AppError> {
    session.require(Operation::Update, Resource::Bookings)?;
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(
        state
            .services
            .bookings
            .cancel(id, reason.as_deref(), &session.username)
            .await?,
    ))
}

/// # GET /api/bookings/:id/payments
pub async fn payments(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Payment>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.for_booking(id).await?))
}

/// # POST /api/bookings/purge
pub async fn purge(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<PurgeBody>,
) -> Result<Json<Value>, AppError> {
    session.require(Operation::Delete, Resource::Bookings)?;
    let removed = state.services.bookings.purge_before(body.before, &session.username).await?;
    Ok(Json(json!({ "removed": removed, "before": body.before })))
}
