// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full stack (temp SQLite database, seeded
//! catalog, booking engine, mock call client, and the HTTP router) and
//! drives requests through the router in-process.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use salonbook_config::{BookingConfig, StorageConfig};
use salonbook_core::{BookingError, BookingStore};
use salonbook_engine::{BookingEngine, catalog};
use salonbook_gateway::{AuthConfig, GatewayState, build_router};
use salonbook_storage::SqliteStorage;

use crate::mock_call_client::MockCallClient;

/// Bearer token installed by default.
pub const TEST_TOKEN: &str = "test-token";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    booking: BookingConfig,
    seed: bool,
    bearer_token: Option<String>,
    webhook_secret: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            booking: BookingConfig::default(),
            seed: true,
            bearer_token: Some(TEST_TOKEN.to_string()),
            webhook_secret: None,
        }
    }

    /// Start with no services or staff.
    pub fn without_catalog(mut self) -> Self {
        self.seed = false;
        self
    }

    pub fn with_booking_config(mut self, booking: BookingConfig) -> Self {
        self.booking = booking;
        self
    }

    pub fn with_bearer_token(mut self, token: Option<&str>) -> Self {
        self.bearer_token = token.map(str::to_string);
        self
    }

    pub fn with_webhook_secret(mut self, secret: &str) -> Self {
        self.webhook_secret = Some(secret.to_string());
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, BookingError> {
        let temp_dir = tempfile::TempDir::new().map_err(BookingError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let store: Arc<dyn BookingStore> = Arc::new(storage);

        if self.seed {
            catalog::seed_catalog(store.as_ref()).await?;
        }

        let engine = BookingEngine::new(store.clone(), self.booking);
        let calls = Arc::new(MockCallClient::new());
        let state = GatewayState::new(
            engine.clone(),
            AuthConfig {
                bearer_token: self.bearer_token.clone(),
                webhook_secret: self.webhook_secret,
            },
        )
        .with_call_client(calls.clone());

        Ok(TestHarness {
            store,
            engine,
            calls,
            router: build_router(state),
            bearer_token: self.bearer_token,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment backed by a temp database.
pub struct TestHarness {
    pub store: Arc<dyn BookingStore>,
    pub engine: BookingEngine,
    /// The mock outbound call client wired into the router.
    pub calls: Arc<MockCallClient>,
    router: Router,
    bearer_token: Option<String>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Seeded harness with the default token.
    pub async fn seeded() -> Result<Self, BookingError> {
        Self::builder().build().await
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Send a request through the router with the configured bearer token.
    ///
    /// Returns the status and the JSON body (`Value::Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = &self.bearer_token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        self.send(builder, body).await
    }

    /// Send a request with exactly the given headers.
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder, body).await
    }

    /// POST a payload to the voice webhook.
    pub async fn post_webhook(&self, payload: Value) -> (StatusCode, Value) {
        self.request_with_headers(Method::POST, "/api/vapi/webhook", &[], Some(payload))
            .await
    }

    async fn send(
        &self,
        builder: axum::http::request::Builder,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid test request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_seeds_catalog() {
        let harness = TestHarness::seeded().await.unwrap();
        assert_eq!(harness.store.list_services().await.unwrap().len(), 6);
        assert_eq!(harness.store.list_staff().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn without_catalog_starts_empty() {
        let harness = TestHarness::builder().without_catalog().build().await.unwrap();
        assert!(harness.store.list_services().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn temp_db_is_unique_per_harness() {
        let h1 = TestHarness::seeded().await.unwrap();
        let h2 = TestHarness::seeded().await.unwrap();
        h1.store.delete_service(1).await.unwrap();
        assert_eq!(h1.store.list_services().await.unwrap().len(), 5);
        assert_eq!(h2.store.list_services().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn health_is_public() {
        let harness = TestHarness::builder()
            .with_bearer_token(None)
            .build()
            .await
            .unwrap();
        let (status, body) = harness.request(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
