// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice platform request/response types.

use serde::{Deserialize, Serialize};

/// Body of `POST /call`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCallRequest {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub customer: CallCustomer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_overrides: Option<AssistantOverrides>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallCustomer {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Template variables the assistant can reference during the call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantOverrides {
    pub variable_values: serde_json::Map<String, serde_json::Value>,
}

/// The fields of a call object this crate reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CallResponse {
    pub id: String,
    #[serde(default = "default_call_status")]
    pub status: String,
}

fn default_call_status() -> String {
    "queued".to_string()
}

/// Function definition as the assistant stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Body of `PATCH /assistant/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAssistantRequest {
    pub functions: Vec<FunctionDefinition>,
}

/// Error body returned by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorResponse {
    /// `message` may be a string or a list of validation messages.
    pub fn summary(&self) -> String {
        let message = match &self.message {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::new(),
        };
        match (&self.error, message.is_empty()) {
            (Some(error), false) => format!("{error}: {message}"),
            (Some(error), true) => error.clone(),
            (None, _) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_call_request_shape() {
        let mut vars = serde_json::Map::new();
        vars.insert("customerName".into(), json!("Jane"));
        let req = CreateCallRequest {
            assistant_id: "asst".into(),
            phone_number_id: "pn".into(),
            customer: CallCustomer {
                number: "+15551234567".into(),
                name: None,
            },
            assistant_overrides: Some(AssistantOverrides {
                variable_values: vars,
            }),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "assistantId": "asst",
                "phoneNumberId": "pn",
                "customer": {"number": "+15551234567"},
                "assistantOverrides": {"variableValues": {"customerName": "Jane"}}
            })
        );
    }

    #[test]
    fn error_summary_variants() {
        let list: ApiErrorResponse = serde_json::from_value(json!({
            "message": ["customer.number must be E.164", "assistantId missing"],
            "error": "Bad Request"
        }))
        .unwrap();
        assert_eq!(
            list.summary(),
            "Bad Request: customer.number must be E.164; assistantId missing"
        );

        let plain: ApiErrorResponse =
            serde_json::from_value(json!({"message": "Unauthorized"})).unwrap();
        assert_eq!(plain.summary(), "Unauthorized");
    }

    #[test]
    fn call_status_defaults_to_queued() {
        let call: CallResponse = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(call.status, "queued");
    }
}
