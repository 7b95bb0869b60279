//! Axum router wiring.
//!
//! Every path and method reaches the counter, like a catch-all root route.

use axum::{routing::any, Router};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(transport::http::increase_counter))
        .fallback(transport::http::increase_counter)
        .with_state(state)
}
