use axum::Router;

pub mod system;
pub mod warehouse;

/// Router for all read-only endpoints.
pub fn router() -> Router {
    Router::new().nest("/warehouse", warehouse::router())
}
