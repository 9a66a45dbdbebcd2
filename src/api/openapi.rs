//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, hosts, sessions, stats, visitors};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Entre API",
        version = "1.0.0",
        description = "Visitor Check-in Kiosk REST API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Sessions (wizard)
        sessions::create_session,
        sessions::get_session,
        sessions::select_type,
        sessions::submit_visitors,
        sessions::select_host,
        sessions::accept_terms,
        sessions::back,
        sessions::close,
        sessions::start_check_out,
        sessions::commit_check_out,
        // Visitors
        visitors::check_in,
        visitors::list_active,
        visitors::list_history,
        visitors::check_out,
        visitors::frequent_names,
        visitors::events,
        // Hosts
        hosts::list_hosts,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Sessions
            sessions::SessionView,
            sessions::SelectTypeRequest,
            sessions::DraftNameRequest,
            sessions::SubmitVisitorsRequest,
            sessions::SelectHostRequest,
            sessions::CheckInCommitResponse,
            sessions::SessionCheckOutRequest,
            sessions::SessionCheckOutResponse,
            // Wizard
            crate::wizard::Step,
            crate::wizard::Field,
            crate::wizard::FieldError,
            crate::wizard::VisitorDraft,
            // Models
            crate::models::visitor::VisitorType,
            crate::models::visitor::VisitorRecord,
            crate::models::visitor::CheckInRequest,
            crate::models::visitor::FrequentName,
            crate::models::visitor::VisitorEvent,
            crate::models::host::Host,
            // Visitors
            visitors::ActiveVisitorsResponse,
            // Stats
            stats::StatsResponse,
            stats::VisitStats,
            stats::StatEntry,
            stats::TimeSeriesEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Kiosk wizard sessions"),
        (name = "visitors", description = "Visitor records"),
        (name = "hosts", description = "Host reference list"),
        (name = "stats", description = "Visitor statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
