//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the websocket gateway, the document endpoints,
//! and the health check. CORS is open because the canvas client is served
//! from a different origin in development.

pub mod auth;
pub mod documents;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/projects/{id}/document",
            get(documents::get_document).put(documents::put_document),
        )
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
