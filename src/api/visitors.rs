//! Visitor record endpoints (admin panel and direct kiosk operations)

use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        visitor::{CheckInRequest, FrequentNamesQuery, HistoryQuery},
        FrequentName, VisitorRecord,
    },
};

/// Active visitor listing with the advertised polling interval
#[derive(serde::Serialize, ToSchema)]
pub struct ActiveVisitorsResponse {
    pub visitors: Vec<VisitorRecord>,
    /// Interval in seconds at which the admin view should refresh
    pub poll_interval_secs: u64,
}

/// Directly check in a single visitor (admin/manual path)
#[utoipa::path(
    post,
    path = "/visitors",
    tag = "visitors",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Visitor checked in", body = VisitorRecord),
        (status = 422, description = "Missing required field")
    )
)]
pub async fn check_in(
    State(state): State<crate::AppState>,
    Json(request): Json<CheckInRequest>,
) -> AppResult<(StatusCode, Json<VisitorRecord>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = state.services.visitors.check_in_one(&request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List visitors currently on site, newest check-in first
#[utoipa::path(
    get,
    path = "/visitors/active",
    tag = "visitors",
    responses(
        (status = 200, description = "Active visitors", body = ActiveVisitorsResponse)
    )
)]
pub async fn list_active(
    State(state): State<crate::AppState>,
) -> AppResult<Json<ActiveVisitorsResponse>> {
    let visitors = state.services.visitors.list_active().await?;
    Ok(Json(ActiveVisitorsResponse {
        visitors,
        poll_interval_secs: state.config.kiosk.poll_interval_secs,
    }))
}

/// List recent visitor history, checked-out records included
#[utoipa::path(
    get,
    path = "/visitors/history",
    tag = "visitors",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Visitor history", body = Vec<VisitorRecord>)
    )
)]
pub async fn list_history(
    State(state): State<crate::AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<VisitorRecord>>> {
    let records = state.services.visitors.list_history(query.limit).await?;
    Ok(Json(records))
}

/// Check a visitor out
#[utoipa::path(
    post,
    path = "/visitors/{id}/check-out",
    tag = "visitors",
    params(("id" = Uuid, Path, description = "Visitor record ID")),
    responses(
        (status = 200, description = "Visitor checked out", body = VisitorRecord),
        (status = 404, description = "Visitor not found"),
        (status = 409, description = "Visitor already checked out")
    )
)]
pub async fn check_out(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VisitorRecord>> {
    let record = state.services.visitors.check_out(id).await?;
    Ok(Json(record))
}

/// Frequent-visitor name suggestions for a company
#[utoipa::path(
    get,
    path = "/visitors/frequent-names",
    tag = "visitors",
    params(FrequentNamesQuery),
    responses(
        (status = 200, description = "Matching names, most frequent first", body = Vec<FrequentName>)
    )
)]
pub async fn frequent_names(
    State(state): State<crate::AppState>,
    Query(query): Query<FrequentNamesQuery>,
) -> AppResult<Json<Vec<FrequentName>>> {
    let names = state
        .services
        .visitors
        .frequent_names(&query.company, &query.prefix)
        .await?;
    Ok(Json(names))
}

/// Server-sent event feed of check-in/check-out events.
/// Push interface for the admin view; polling `/visitors/active` remains
/// the fallback.
#[utoipa::path(
    get,
    path = "/visitors/events",
    tag = "visitors",
    responses(
        (status = 200, description = "SSE stream of visitor events")
    )
)]
pub async fn events(
    State(state): State<crate::AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.services.visitors.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| {
        // Lagged receivers just skip missed events.
        let event = event.ok()?;
        Event::default().json_data(&event).ok().map(Ok)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
