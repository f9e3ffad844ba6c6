//! Shared harness for integration tests
//!
//! Routes requests through the real router with the deterministic mock
//! embedding service and the in-memory store.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use braid_core::RoutingPolicy;
use braid_embed::MockEmbeddingService;
use braid_server::api;
use braid_server::facts::HeuristicFactExtractor;
use braid_server::state::AppState;
use braid_store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub store: MemoryStore,
    pub embeddings: Arc<MockEmbeddingService>,
}

pub fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let embeddings = Arc::new(MockEmbeddingService::default_384());
    let state = AppState::new(
        Arc::new(store.clone()),
        embeddings.clone(),
        Arc::new(HeuristicFactExtractor::new()),
        RoutingPolicy::default(),
    );
    TestApp {
        app: api::router(state),
        store,
        embeddings,
    }
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Route one message and return the `data` payload, asserting success.
pub async fn route(app: &Router, body: Value) -> Value {
    let (status, response) = post_json(app, "/messages", body).await;
    assert_eq!(status, StatusCode::OK, "unexpected response: {response}");
    assert_eq!(response["success"], true, "unexpected response: {response}");
    response["data"].clone()
}
