pub mod health;
pub mod multipart;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::matching::handlers as matching;
use crate::screening::handlers as screening;
use crate::state::AppState;

/// Room for multipart boundaries and the `job` field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 256 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume extraction
        .route(
            "/api/v1/resumes/extract",
            post(screening::handle_extract_resume),
        )
        // Matching
        .route("/api/v1/matches", post(matching::handle_create_match))
        .route("/api/v1/matches/:id", get(matching::handle_get_match))
        .route("/api/v1/matches/:id/report", get(matching::handle_get_report))
        // Interview questions
        .route(
            "/api/v1/matches/:id/interview-questions",
            post(interview::handle_generate_questions).get(interview::handle_get_questions),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
