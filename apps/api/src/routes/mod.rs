pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::billing::handlers as billing;
use crate::history;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session API
        .route("/api/v1/sessions/:identity", get(matching::handle_get_session))
        .route(
            "/api/v1/sessions/:identity/document",
            put(matching::handle_put_document),
        )
        .route(
            "/api/v1/sessions/:identity/job-description",
            put(matching::handle_put_job_description),
        )
        .route(
            "/api/v1/sessions/:identity/analyze",
            post(matching::handle_analyze),
        )
        .route(
            "/api/v1/sessions/:identity/improve",
            post(matching::handle_improve),
        )
        .route(
            "/api/v1/sessions/:identity/improve/accept",
            post(matching::handle_accept),
        )
        .route(
            "/api/v1/sessions/:identity/improve/discard",
            post(matching::handle_discard),
        )
        .route(
            "/api/v1/sessions/:identity/candidate",
            get(matching::handle_get_candidate),
        )
        // Plan API
        .route("/api/v1/plans/:identity", get(billing::handle_get_plan))
        .route(
            "/api/v1/plans/:identity/checkout",
            post(billing::handle_checkout),
        )
        // History API
        .route("/api/v1/history/:identity", get(history::handle_get_history))
        .with_state(state)
}
