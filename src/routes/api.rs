use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/api/debate/start", post(api::start_debate))
        .route("/api/debate/{session_id}/scores", get(api::get_scores))
        .route("/api/debate/{session_id}/end", post(api::end_debate))
        .route("/api/user/stats", get(api::user_stats))
        .layer(TraceLayer::new_for_http())
}
