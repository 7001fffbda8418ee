// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound call client for deterministic testing.
//!
//! `MockCallClient` implements `CallClient` without network access and
//! records every call it was asked to place.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use salonbook_core::{
    BookingError, CallClient, CallHandle, Component, ComponentType, CustomerContext,
    HealthStatus,
};

/// One call placed through the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedCall {
    pub id: String,
    pub phone_number: String,
    pub customer: CustomerContext,
}

/// Records calls and hands out sequential ids (`mock-call-1`, ...).
#[derive(Default)]
pub struct MockCallClient {
    next_id: AtomicU64,
    placed: Mutex<Vec<PlacedCall>>,
}

impl MockCallClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call placed so far, oldest first.
    pub async fn placed_calls(&self) -> Vec<PlacedCall> {
        self.placed.lock().await.clone()
    }
}

#[async_trait]
impl Component for MockCallClient {
    fn name(&self) -> &str {
        "mock-voice"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Voice
    }

    async fn health_check(&self) -> Result<HealthStatus, BookingError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BookingError> {
        Ok(())
    }
}

#[async_trait]
impl CallClient for MockCallClient {
    async fn create_call(
        &self,
        phone_number: &str,
        customer: CustomerContext,
    ) -> Result<CallHandle, BookingError> {
        let id = format!("mock-call-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.placed.lock().await.push(PlacedCall {
            id: id.clone(),
            phone_number: phone_number.to_string(),
            customer,
        });
        Ok(CallHandle {
            id,
            status: "queued".to_string(),
        })
    }

    async fn get_call(&self, call_id: &str) -> Result<Value, BookingError> {
        let placed = self.placed.lock().await;
        let call = placed
            .iter()
            .find(|c| c.id == call_id)
            .ok_or_else(|| BookingError::not_found("call", call_id))?;
        Ok(json!({
            "id": call.id,
            "status": "queued",
            "customer": {"number": call.phone_number},
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_are_recorded_in_order() {
        let mock = MockCallClient::new();
        let first = mock
            .create_call("+15550000001", CustomerContext::default())
            .await
            .unwrap();
        let second = mock
            .create_call(
                "+15550000002",
                CustomerContext {
                    name: Some("Jane".into()),
                    email: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, "mock-call-1");
        assert_eq!(second.id, "mock-call-2");
        let placed = mock.placed_calls().await;
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].customer.name.as_deref(), Some("Jane"));
    }

    #[tokio::test]
    async fn unknown_call_is_not_found() {
        let mock = MockCallClient::new();
        let err = mock.get_call("nope").await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { .. }));
    }
}
