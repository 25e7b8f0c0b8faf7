use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use warehub_api::app::services::{AppServices, start_pipeline};
use warehub_core::WarehouseKey;
use warehub_events::InMemoryBroker;
use warehub_infra::{Config, InMemoryInventoryStore, InventoryStore};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let services = Arc::new(services);
        let app = warehub_api::app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
        self.services.shutdown();
    }
}

async fn get_data(client: &reqwest::Client, base_url: &str) -> serde_json::Value {
    let res = client
        .get(format!("{}/warehouse/data", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn(AppServices::new(Arc::new(InMemoryInventoryStore::new()))).await;

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_store_is_an_empty_object() {
    let srv = TestServer::spawn(AppServices::new(Arc::new(InMemoryInventoryStore::new()))).await;

    let body = get_data(&reqwest::Client::new(), &srv.base_url).await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn store_contents_are_returned_verbatim() {
    let store = Arc::new(InMemoryInventoryStore::new());
    let linz = r#"{"id":"Warehouse_Linz","item":"Reifen","count":40}"#;
    let other = "no warehouse here";
    store.put(WarehouseKey::Linz, linz.to_string()).unwrap();
    store.put(WarehouseKey::Unknown, other.to_string()).unwrap();

    let srv = TestServer::spawn(AppServices::new(store)).await;

    let body = get_data(&reqwest::Client::new(), &srv.base_url).await;
    assert_eq!(body, json!({ "Linz": linz, "Unbekannt": other }));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let srv = TestServer::spawn(AppServices::new(Arc::new(InMemoryInventoryStore::new()))).await;

    let res = reqwest::get(format!("{}/warehouse/nope", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pipeline_records_become_visible() {
    let config = Config {
        linz_interval: Duration::from_millis(50),
        wien_interval: Duration::from_millis(75),
        ..Config::default()
    };
    let store = Arc::new(InMemoryInventoryStore::new());
    let workers = start_pipeline(&config, Arc::new(InMemoryBroker::new()), store.clone()).unwrap();

    let srv = TestServer::spawn(AppServices::with_workers(store, workers)).await;
    let client = reqwest::Client::new();

    // The pipeline is eventually consistent: poll until both warehouses arrive.
    for _ in 0..100 {
        let body = get_data(&client, &srv.base_url).await;
        if body.get("Linz").is_some() && body.get("Wien").is_some() {
            assert_eq!(body["Linz"], r#"{"id":"Warehouse_Linz","item":"Reifen","count":40}"#);
            assert_eq!(body["Wien"], r#"{"id":"Warehouse_Wien","item":"Felgen","count":100}"#);
            assert!(body.get("Unbekannt").is_none());
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    panic!("emitted records did not reach the store within timeout");
}
