use super::RangeQuery;
use crate::{AppState, auth::CurrentSession, error::AppError};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use core_types::{Operation, Resource};
use database::{
    ClientRanking, CourtRanking, DateRange, GeneralStats, HourlyStat, MonthlyStat, StatusCount,
    WeekdayStat,
};
use serde::Deserialize;
use services::Dashboard;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default = "default_ranking_limit")]
    pub limit: i64,
}

fn default_ranking_limit() -> i64 {
    10
}

/// # GET /api/dashboard?from=&to=
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Dashboard>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.dashboard(range.into()).await?))
}

/// # GET /api/reports/general?from=&to=
pub async fn general(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<GeneralStats>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.general(range.into()).await?))
}

/// # GET /api/reports/by-status?from=&to=
pub async fn by_status(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<StatusCount>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.by_status(range.into()).await?))
}

/// # GET /api/reports/monthly?year=
pub async fn monthly(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<MonthlyStat>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.monthly(query.year).await?))
}

/// # GET /api/reports/top-clients?from=&to=&limit=
pub async fn top_clients(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<ClientRanking>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    let range = DateRange::new(query.from, query.to);
    Ok(Json(state.services.reports.top_clients(range, query.limit).await?))
}

/// # GET /api/reports/top-courts?from=&to=&limit=
pub async fn top_courts(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<RankingQuery>,
) -> Result<Json<Vec<CourtRanking>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    let range = DateRange::new(query.from, query.to);
    Ok(Json(state.services.reports.top_courts(range, query.limit).await?))
}

/// # GET /api/reports/hourly?from=&to=
pub async fn hourly(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<HourlyStat>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.hourly(range.into()).await?))
}

/// # GET /api/reports/weekday?from=&to=
pub async fn weekday(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<WeekdayStat>>, AppError> {
    session.require(Operation::Read, Resource::Reports)?;
    Ok(Json(state.services.reports.weekday(range.into()).await?))
}
