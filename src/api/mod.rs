mod extract;
mod handlers;
mod models;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use extract::RelayPayload;
pub use handlers::{health, info, not_found, relay};
pub use models::{
    Endpoints, ErrorResponse, HealthResponse, RelayRequest, RelayResponse, ServiceInfo,
};

pub const RELAY_PATH: &str = "/api/gemini";
pub const HEALTH_PATH: &str = "/health";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(info))
        .route(HEALTH_PATH, get(health))
        .route(RELAY_PATH, post(relay))
        .fallback(not_found)
        .with_state(state)
}
