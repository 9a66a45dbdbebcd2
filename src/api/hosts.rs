//! Host reference list endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::Host};

/// List the hosts a visitor can be registered against
#[utoipa::path(
    get,
    path = "/hosts",
    tag = "hosts",
    responses(
        (status = 200, description = "Host list", body = Vec<Host>)
    )
)]
pub async fn list_hosts(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Host>>> {
    let hosts = state.services.hosts.list().await?;
    Ok(Json(hosts))
}
