//! Shared harness: the real router over a `MemoryStore`, bound to an ephemeral port.

#![allow(dead_code)]

use color_sync_hub::transport;
use color_sync_hub::{ExportClient, MemoryStore, ReferencePolicy, SyncCoordinator, SyncStore};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
    server: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn coordinator(store: Arc<MemoryStore>, policy: ReferencePolicy) -> SyncCoordinator {
    let client = ExportClient::new(Some(Duration::from_secs(10))).unwrap();
    let store: Arc<dyn SyncStore> = store;
    SyncCoordinator::new(store, client, policy)
}

pub async fn spawn_app(policy: ReferencePolicy) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Arc::new(coordinator(store.clone(), policy));
    let dyn_store: Arc<dyn SyncStore> = store.clone();
    let router = transport::http::create_router(transport::http::AppState::new(coordinator, dyn_store));

    // Bind to an ephemeral port to avoid conflicts if an API server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        server,
    }
}

impl TestApp {
    pub fn sync_url(&self, query: &str) -> String {
        format!("{}/api/sync?{}", self.base_url, query)
    }

    /// `GET /api/sync?<query>` returning status and JSON body.
    pub async fn get(&self, query: &str) -> (u16, JsonValue) {
        let resp = self.client.get(self.sync_url(query)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    pub async fn post(&self, query: &str, body: JsonValue) -> (u16, JsonValue) {
        let resp = self
            .client
            .post(self.sync_url(query))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    /// Registers a source and returns its id.
    pub async fn register(&self, app_name: &str, app_url: &str, export_endpoint: &str) -> String {
        let (status, body) = self
            .post(
                "action=register",
                json!({
                    "app_name": app_name,
                    "app_url": app_url,
                    "export_endpoint": export_endpoint
                }),
            )
            .await;
        assert_eq!(status, 200, "register failed: {}", body);
        body["source"]["id"].as_str().unwrap().to_string()
    }

    pub async fn sync(&self, source_id: &str) -> (u16, JsonValue) {
        self.get(&format!("action=sync&source_id={}", source_id)).await
    }

    pub async fn status(&self, source_id: &str) -> JsonValue {
        let (status, body) = self
            .get(&format!("action=status&source_id={}", source_id))
            .await;
        assert_eq!(status, 200, "status failed: {}", body);
        body["source"].clone()
    }
}
