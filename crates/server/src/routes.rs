use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{health, predict_frame};
use crate::state::AppState;
use crate::ws::ws_score;

/// The extension calls from arbitrary page origins, so CORS is open.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_score))
        .route("/predict/frame", post(predict_frame))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}
