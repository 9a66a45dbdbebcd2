//! Wizard session endpoints
//!
//! Each kiosk drives its check-in wizard through these routes; the session
//! holds the draft state server-side and no record is written until the
//! terms step commits.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Host, VisitorRecord, VisitorType},
    wizard::{DraftName, FieldError, Step, VisitorDraft, Wizard},
};

/// Snapshot of a wizard session
#[derive(Serialize, ToSchema)]
pub struct SessionView {
    pub id: Uuid,
    pub step: Step,
    pub visitor_type: Option<VisitorType>,
    pub drafts: Vec<VisitorDraft>,
    pub company: String,
    pub host: Option<Host>,
    /// Validation flags from the last visitor-info submission
    pub field_errors: Vec<FieldError>,
    /// Seconds left on the confirmation screen
    pub countdown: u8,
    pub commit_pending: bool,
}

impl SessionView {
    pub fn of(id: Uuid, wizard: &Wizard) -> Self {
        Self {
            id,
            step: wizard.step(),
            visitor_type: wizard.visitor_type(),
            drafts: wizard.drafts().to_vec(),
            company: wizard.company().to_string(),
            host: wizard.host().cloned(),
            field_errors: wizard.field_errors().to_vec(),
            countdown: wizard.countdown(),
            commit_pending: wizard.commit_pending(),
        }
    }
}

/// Visitor type selection request
#[derive(Deserialize, ToSchema)]
pub struct SelectTypeRequest {
    pub visitor_type: VisitorType,
}

/// One name pair on the visitor-info form
#[derive(Deserialize, ToSchema)]
pub struct DraftNameRequest {
    pub first_name: String,
    pub last_name: String,
}

/// Visitor-info form submission
#[derive(Deserialize, ToSchema)]
pub struct SubmitVisitorsRequest {
    pub company: String,
    pub visitors: Vec<DraftNameRequest>,
}

/// Host selection request
#[derive(Deserialize, ToSchema)]
pub struct SelectHostRequest {
    pub host_id: i32,
}

/// Successful check-in commit
#[derive(Serialize, ToSchema)]
pub struct CheckInCommitResponse {
    pub session: SessionView,
    /// The persisted records, one per visitor
    pub records: Vec<VisitorRecord>,
}

/// Check-out commit request
#[derive(Deserialize, ToSchema)]
pub struct SessionCheckOutRequest {
    pub record_id: Uuid,
}

/// Check-out commit result
#[derive(Serialize, ToSchema)]
pub struct SessionCheckOutResponse {
    pub session: SessionView,
    pub record: VisitorRecord,
}

/// Create a new wizard session
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionView)
    )
)]
pub async fn create_session(
    State(state): State<crate::AppState>,
) -> (StatusCode, Json<SessionView>) {
    let view = state.services.sessions.create().await;
    (StatusCode::CREATED, Json(view))
}

/// Get the current session state
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn get_session(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let view = state.services.sessions.view(id).await?;
    Ok(Json(view))
}

/// Choose the visitor type
#[utoipa::path(
    post,
    path = "/sessions/{id}/type",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SelectTypeRequest,
    responses(
        (status = 200, description = "Advanced to visitor-info", body = SessionView),
        (status = 400, description = "Not valid in the current step"),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn select_type(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectTypeRequest>,
) -> AppResult<Json<SessionView>> {
    let view = state
        .services
        .sessions
        .select_type(id, request.visitor_type)
        .await?;
    Ok(Json(view))
}

/// Submit visitor names and company
#[utoipa::path(
    post,
    path = "/sessions/{id}/visitors",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SubmitVisitorsRequest,
    responses(
        (status = 200, description = "Advanced to host-selection", body = SessionView),
        (status = 422, description = "Blank fields flagged; wizard holds", body = SessionView),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn submit_visitors(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitVisitorsRequest>,
) -> AppResult<(StatusCode, Json<SessionView>)> {
    let names = request
        .visitors
        .into_iter()
        .map(|v| DraftName {
            first_name: v.first_name,
            last_name: v.last_name,
        })
        .collect();

    let view = state
        .services
        .sessions
        .submit_visitors(id, names, request.company)
        .await?;

    let status = if view.field_errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(view)))
}

/// Pick the host being visited
#[utoipa::path(
    post,
    path = "/sessions/{id}/host",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SelectHostRequest,
    responses(
        (status = 200, description = "Advanced to terms", body = SessionView),
        (status = 404, description = "Session or host not found")
    )
)]
pub async fn select_host(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectHostRequest>,
) -> AppResult<Json<SessionView>> {
    let host = state.services.hosts.get(request.host_id).await?;
    let view = state.services.sessions.select_host(id, host).await?;
    Ok(Json(view))
}

/// Accept terms and commit the check-in.
/// On a backend failure the wizard stays in `terms` and the error is
/// returned; nothing is persisted.
#[utoipa::path(
    post,
    path = "/sessions/{id}/terms",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Visitors checked in", body = CheckInCommitResponse),
        (status = 409, description = "A commit is already in flight"),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn accept_terms(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<CheckInCommitResponse>)> {
    let order = state.services.sessions.begin_commit(id).await?;

    match state.services.visitors.check_in(&order).await {
        Ok(records) => {
            let session = state.services.sessions.finish_commit(id, true).await?;
            Ok((
                StatusCode::CREATED,
                Json(CheckInCommitResponse { session, records }),
            ))
        }
        Err(err) => {
            // Surface the store error; the wizard re-enables its submit.
            if let Err(e) = state.services.sessions.finish_commit(id, false).await {
                tracing::warn!(session = %id, error = %e, "failed to release commit flag");
            }
            Err(err)
        }
    }
}

/// Navigate one step back
#[utoipa::path(
    post,
    path = "/sessions/{id}/back",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Stepped back", body = SessionView),
        (status = 400, description = "Not valid in the current step"),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn back(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let view = state.services.sessions.back(id).await?;
    Ok(Json(view))
}

/// Dismiss the confirmation screen or abandon check-out
#[utoipa::path(
    post,
    path = "/sessions/{id}/close",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Back at type-selection", body = SessionView),
        (status = 400, description = "Not valid in the current step"),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn close(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let view = state.services.sessions.close(id).await?;
    Ok(Json(view))
}

/// Enter the check-out flow
#[utoipa::path(
    post,
    path = "/sessions/{id}/check-out/start",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Check-out flow entered", body = SessionView),
        (status = 400, description = "Not valid in the current step"),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn start_check_out(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionView>> {
    let view = state.services.sessions.start_check_out(id).await?;
    Ok(Json(view))
}

/// Check out the selected visitor record
#[utoipa::path(
    post,
    path = "/sessions/{id}/check-out",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SessionCheckOutRequest,
    responses(
        (status = 200, description = "Visitor checked out", body = SessionCheckOutResponse),
        (status = 404, description = "Session or visitor not found"),
        (status = 409, description = "Visitor already checked out")
    )
)]
pub async fn commit_check_out(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SessionCheckOutRequest>,
) -> AppResult<Json<SessionCheckOutResponse>> {
    state.services.sessions.begin_check_out(id).await?;

    match state.services.visitors.check_out(request.record_id).await {
        Ok(record) => {
            let session = state.services.sessions.finish_check_out(id, true).await?;
            Ok(Json(SessionCheckOutResponse { session, record }))
        }
        Err(err) => {
            if let Err(e) = state.services.sessions.finish_check_out(id, false).await {
                tracing::warn!(session = %id, error = %e, "failed to release check-out flag");
            }
            Err(err)
        }
    }
}
