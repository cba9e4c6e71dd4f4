pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/job-details", post(handlers::handle_job_details))
        .route(
            "/api/v1/resume/extract",
            post(handlers::handle_extract_resume),
        )
        .route(
            "/api/v1/cover-letter/download",
            post(handlers::handle_download_cover_letter),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
