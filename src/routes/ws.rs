use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;

/// Create the WebSocket router.
///
/// The `/ws` endpoint is unauthenticated; this serves a local single-player
/// game and the socket only attaches to sessions created through the HTTP
/// API on the same server.
pub fn create_ws_router() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_debate_handler))
        .layer(TraceLayer::new_for_http())
}
