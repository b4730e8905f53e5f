//! Storybook PDF Service Library
//!
//! Renders personalized children's-book stories to PDF: HTML assembly from
//! template assets plus headless-Chromium rasterization, behind a small
//! HTTP surface. The library crate exposes the full module tree plus the
//! router builder so integration tests can drive the service in-process.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod assemble;
pub mod assets;
pub mod book;
pub mod config;
pub mod error;
pub mod palette;
pub mod render;
pub mod routes;
pub mod service;
pub mod state;

pub use state::AppState;

/// Build the service router with its middleware stack.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/pdf", routes::pdf::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
