use std::sync::Arc;

use axum::{Json, Router, extract::Extension, routing::get};

use warehub_infra::InventoryStore;

use crate::app::dto::WarehouseDataResponse;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/data", get(get_warehouse_data))
}

/// Full current store contents; no filtering, no pagination.
pub async fn get_warehouse_data(Extension(services): Extension<Arc<AppServices>>) -> Json<WarehouseDataResponse> {
    let entries = services.store().get_all();
    tracing::info!(entries = entries.len(), "warehouse data requested");
    Json(entries.into())
}
