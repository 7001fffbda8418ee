// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice-call platform client for salonbook.
//!
//! Implements [`CallClient`] for placing outbound booking calls and syncs the
//! booking function definitions to the platform assistant.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use salonbook_config::VoiceConfig;
use salonbook_core::{
    BookingError, CallClient, CallHandle, Component, ComponentType, CustomerContext,
    HealthStatus,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::VapiHttpClient;
use crate::types::{
    AssistantOverrides, CallCustomer, CallResponse, CreateCallRequest, FunctionDefinition,
    UpdateAssistantRequest,
};

/// Voice platform client bound to one assistant and one outbound number.
pub struct VapiCallClient {
    http: VapiHttpClient,
    assistant_id: String,
    phone_number_id: String,
}

impl VapiCallClient {
    /// Build a client from `[voice]` configuration.
    ///
    /// Fails when the API key, assistant id, or phone number id is missing.
    pub fn from_config(config: &VoiceConfig) -> Result<Self, BookingError> {
        let api_key = required(&config.api_key, "voice.api_key")?;
        let assistant_id = required(&config.assistant_id, "voice.assistant_id")?;
        let phone_number_id = required(&config.phone_number_id, "voice.phone_number_id")?;
        let http = VapiHttpClient::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(base_url = %config.base_url, "voice client initialized");
        Ok(Self::with_http(http, assistant_id, phone_number_id))
    }

    pub fn with_http(http: VapiHttpClient, assistant_id: &str, phone_number_id: &str) -> Self {
        Self {
            http,
            assistant_id: assistant_id.to_string(),
            phone_number_id: phone_number_id.to_string(),
        }
    }

    /// Replace the assistant's function list with `definitions`.
    ///
    /// Each definition is `{name, description, parameters}`; anything else
    /// is rejected before the request is sent.
    pub async fn sync_tools(&self, definitions: &[Value]) -> Result<Vec<String>, BookingError> {
        let functions = definitions
            .iter()
            .map(|d| {
                serde_json::from_value::<FunctionDefinition>(d.clone()).map_err(|e| {
                    BookingError::Validation(format!("invalid function definition: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let names: Vec<String> = functions.iter().map(|f| f.name.clone()).collect();

        let _: Value = self
            .http
            .patch(
                &format!("/assistant/{}", self.assistant_id),
                &UpdateAssistantRequest { functions },
            )
            .await?;
        info!(assistant_id = %self.assistant_id, functions = ?names, "assistant functions synced");
        Ok(names)
    }
}

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, BookingError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BookingError::Config(format!("{key} is required for the voice client")))
}

#[async_trait]
impl Component for VapiCallClient {
    fn name(&self) -> &str {
        "vapi"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Voice
    }

    async fn health_check(&self) -> Result<HealthStatus, BookingError> {
        // No cheap unauthenticated endpoint; a built client is considered healthy.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BookingError> {
        debug!("voice client shutting down");
        Ok(())
    }
}

#[async_trait]
impl CallClient for VapiCallClient {
    async fn create_call(
        &self,
        phone_number: &str,
        customer: CustomerContext,
    ) -> Result<CallHandle, BookingError> {
        let mut variables = serde_json::Map::new();
        if let Some(name) = &customer.name {
            variables.insert("customerName".into(), Value::String(name.clone()));
        }
        if let Some(email) = &customer.email {
            variables.insert("customerEmail".into(), Value::String(email.clone()));
        }
        let request = CreateCallRequest {
            assistant_id: self.assistant_id.clone(),
            phone_number_id: self.phone_number_id.clone(),
            customer: CallCustomer {
                number: phone_number.to_string(),
                name: customer.name.clone(),
            },
            assistant_overrides: (!variables.is_empty()).then_some(AssistantOverrides {
                variable_values: variables,
            }),
        };

        let call: CallResponse = self.http.post("/call", &request).await?;
        info!(call_id = %call.id, status = %call.status, "outbound call created");
        Ok(CallHandle {
            id: call.id,
            status: call.status,
        })
    }

    async fn get_call(&self, call_id: &str) -> Result<Value, BookingError> {
        self.http.get(&format!("/call/{call_id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VapiCallClient {
        VapiCallClient::from_config(&VoiceConfig {
            enabled: true,
            base_url: server.uri(),
            api_key: Some("key".into()),
            assistant_id: Some("asst-1".into()),
            phone_number_id: Some("pn-1".into()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn create_call_posts_customer_and_variables() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call"))
            .and(body_json(json!({
                "assistantId": "asst-1",
                "phoneNumberId": "pn-1",
                "customer": {"number": "+15551234567", "name": "Jane"},
                "assistantOverrides": {"variableValues": {
                    "customerName": "Jane",
                    "customerEmail": "jane@example.com"
                }}
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "call-9", "status": "queued"})),
            )
            .mount(&server)
            .await;

        let handle = client(&server)
            .create_call(
                "+15551234567",
                CustomerContext {
                    name: Some("Jane".into()),
                    email: Some("jane@example.com".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(handle.id, "call-9");
        assert_eq!(handle.status, "queued");
    }

    #[tokio::test]
    async fn get_call_returns_raw_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/call/call-9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "call-9", "status": "ended", "cost": 0.12})),
            )
            .mount(&server)
            .await;

        let call = client(&server).get_call("call-9").await.unwrap();
        assert_eq!(call["status"], "ended");
    }

    #[tokio::test]
    async fn sync_tools_patches_assistant() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/assistant/asst-1"))
            .and(body_json(json!({"functions": [
                {"name": "getServices", "description": "List services",
                 "parameters": {"type": "object", "properties": {}}}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "asst-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let names = client(&server)
            .sync_tools(&[json!({
                "name": "getServices",
                "description": "List services",
                "parameters": {"type": "object", "properties": {}}
            })])
            .await
            .unwrap();
        assert_eq!(names, vec!["getServices".to_string()]);
    }

    #[test]
    fn missing_credentials_rejected() {
        let err = VapiCallClient::from_config(&VoiceConfig::default()).err().unwrap();
        assert!(err.to_string().contains("voice.api_key"));
    }

    #[tokio::test]
    async fn invalid_definition_not_sent() {
        let server = MockServer::start().await;
        let err = client(&server)
            .sync_tools(&[json!({"name": "x"})])
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }
}
