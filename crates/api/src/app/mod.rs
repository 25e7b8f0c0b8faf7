//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: broker selection, topic provisioning, background workers
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response shapes

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
