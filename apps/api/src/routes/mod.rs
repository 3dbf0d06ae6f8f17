pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::documents::handlers::handle_extract;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Documents
        .route("/api/v1/documents/extract", post(handle_extract))
        // Resume analysis and session history
        .route("/api/v1/resume/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/resume/session",
            get(handlers::handle_get_session).delete(handlers::handle_clear_session),
        )
        .route("/api/v1/resume/history", get(handlers::handle_history))
        // Job matching
        .route("/api/v1/jobs/match", post(handlers::handle_match_job))
        .route("/api/v1/jobs/tailor", post(handlers::handle_tailor))
        // Career advice (search grounded)
        .route(
            "/api/v1/career/advice",
            post(handlers::handle_career_advice),
        )
        .with_state(state)
}
