use super::RangeQuery;
use crate::{AppState, auth::CurrentSession, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use core_types::{NewPayment, Operation, Page, PageRequest, Payment, PaymentMethod, PaymentUpdate, Resource};
use database::PaymentStats;
use std::sync::Arc;

/// # GET /api/payments?page=&limit=
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Payment>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.list(page).await?))
}

/// # GET /api/payments/between?from=&to=
pub async fn between(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Payment>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.between(range.into()).await?))
}

/// # GET /api/payments/method/:method
pub async fn by_method(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(method): Path<String>,
) -> Result<Json<Vec<Payment>>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    let method: PaymentMethod = method.parse()?;
    Ok(Json(state.services.payments.by_method(method).await?))
}

/// # GET /api/payments/stats?from=&to=
pub async fn stats(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<PaymentStats>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.stats(range.into()).await?))
}

/// # POST /api/payments
pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Json(payment): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    session.require(Operation::Create, Resource::Payments)?;
    let created = state.services.payments.register(&payment, &session.username).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// # GET /api/payments/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<Json<Payment>, AppError> {
    session.require(Operation::Read, Resource::Payments)?;
    Ok(Json(state.services.payments.get(id).await?))
}

/// # PUT /api/payments/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
    Json(update): Json<PaymentUpdate>,
) -> Result<Json<Payment>, AppError> {
    session.require(Operation::Update, Resource::Payments)?;
    Ok(Json(state.services.payments.update(id, &update, &session.username).await?))
}

/// # DELETE /api/payments/:id
pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    session.require(Operation::Delete, Resource::Payments)?;
    state.services.payments.delete(id, &session.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
