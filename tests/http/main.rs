//! HTTP admin API integration tests.
//!
//! Starts an axum server on an ephemeral port and exercises it with reqwest.

#![cfg(feature = "http")]


use std::sync::Arc;

use serial_press::http::{self, AdminApi};
use serial_press::{ArticleDesk, ConsistencyManager, InMemoryDocumentStore, PressConfig};

/// Bind to port 0 and return the base URL.
pub async fn start_server() -> String {
    let store = Arc::new(InMemoryDocumentStore::new().with_index("chapters", "storyId"));
    let api = Arc::new(AdminApi::new(
        ConsistencyManager::new(store.clone(), PressConfig::default()),
        ArticleDesk::new(store),
    ));
    let app = http::router(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_check() {
    let base = start_server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}
