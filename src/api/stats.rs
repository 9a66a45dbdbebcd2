//! Statistics endpoints

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

/// Statistics response
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Visit totals over standard windows
    pub visits: VisitStats,
    /// Visitors currently on site
    pub on_site: i64,
    /// Top companies by visit count
    pub companies: Vec<StatEntry>,
    /// Daily visit counts for the last 30 days
    pub daily: Vec<TimeSeriesEntry>,
    /// Regular vs service personnel breakdown
    pub visitor_types: Vec<StatEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct VisitStats {
    pub total: i64,
    pub today: i64,
    pub last_7_days: i64,
    pub last_30_days: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StatEntry {
    pub label: String,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct TimeSeriesEntry {
    pub date: NaiveDate,
    pub count: i64,
}

/// Get visitor statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Visitor statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<StatsResponse>> {
    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
