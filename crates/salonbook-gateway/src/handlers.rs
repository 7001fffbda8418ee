// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers for the health check and the voice platform routes.
//!
//! The webhook accepts every event shape the platform sends and dispatches
//! on the event type: in-call function invocations go to the tool registry,
//! end-of-call reports go to the booking orchestrator, and everything else is
//! acknowledged.

use std::collections::HashSet;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use salonbook_core::{CallClient, CustomerContext, HealthStatus};
use salonbook_engine::CallDisposition;
use salonbook_engine::extraction::CallEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::response::{ApiError, ApiResult, Envelope, ok};
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> impl IntoResponse {
    let (code, storage) = match state.engine.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(msg)) => (StatusCode::OK, format!("degraded: {msg}")),
        Ok(HealthStatus::Unhealthy(msg)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {msg}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    let body = HealthResponse {
        status: if code == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage,
    };
    (code, Json(body))
}

/// POST /api/vapi/webhook
pub async fn post_webhook(
    State(state): State<GatewayState>,
    WithRejection(Json(payload), _): WithRejection<Json<Value>, ApiError>,
) -> ApiResult {
    let envelope = CallEnvelope::from_value(&payload);
    debug!(
        event_type = ?envelope.event_type,
        call_id = ?envelope.call_id,
        "webhook received"
    );

    match envelope.event_type.as_deref() {
        Some("function-call") => {
            let Some(call) = envelope.pending_calls.first() else {
                return Err(ApiError::BadRequest(
                    "function-call event carries no functionCall".to_string(),
                ));
            };
            let result = state
                .engine
                .tools
                .dispatch(&call.name, call.arguments.clone())
                .await;
            Ok(Json(result).into_response())
        }
        Some("tool-calls") => {
            // The same call can be listed under several keys.
            let mut seen = HashSet::new();
            let mut results = Vec::new();
            for call in &envelope.pending_calls {
                if let Some(id) = &call.id
                    && !seen.insert(id.clone())
                {
                    continue;
                }
                let result = state
                    .engine
                    .tools
                    .dispatch(&call.name, call.arguments.clone())
                    .await;
                results.push(json!({"toolCallId": call.id, "result": result}));
            }
            Ok(Json(json!({ "results": results })).into_response())
        }
        Some("end-of-call-report" | "call.ended" | "call.completed") | None => {
            process_call(&state, &payload).await
        }
        Some("conversation-update") if conversation_ended(&payload) => {
            process_call(&state, &payload).await
        }
        Some(other) => ok(Envelope::message(true, format!("Event {other} acknowledged"))),
    }
}

fn conversation_ended(payload: &Value) -> bool {
    ["/conversation/status", "/message/conversation/status", "/message/status"]
        .iter()
        .any(|pointer| payload.pointer(pointer).and_then(Value::as_str) == Some("ended"))
}

async fn process_call(state: &GatewayState, payload: &Value) -> ApiResult {
    let outcome = state.engine.orchestrator.process_call(payload).await?;
    let message = outcome.message();
    let success = outcome.disposition != CallDisposition::Conflict;
    let mut body = Envelope::data(outcome).with_message(message);
    body.success = success;
    ok(body)
}

/// POST /api/vapi/tools/{name}
///
/// An empty body invokes the tool without arguments.
pub async fn post_tool(
    State(state): State<GatewayState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, ApiError>,
    body: Bytes,
) -> ApiResult {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?
    };
    let result = state.engine.tools.dispatch(&name, args).await;
    Ok(Json(result).into_response())
}

/// GET /api/vapi/functions
pub async fn get_functions(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.tools.definitions()))
}

/// GET /api/vapi/services
pub async fn get_voice_services(State(state): State<GatewayState>) -> ApiResult {
    let result = state.engine.tools.dispatch("getServices", Value::Null).await;
    Ok(Json(result).into_response())
}

/// GET /api/vapi/staff
pub async fn get_voice_staff(State(state): State<GatewayState>) -> ApiResult {
    let result = state.engine.tools.dispatch("getStaff", Value::Null).await;
    Ok(Json(result).into_response())
}

/// Request body for POST /api/vapi/calls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCallRequest {
    pub phone_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

fn call_client(state: &GatewayState) -> Result<&dyn CallClient, ApiError> {
    state
        .calls
        .as_deref()
        .ok_or_else(|| ApiError::Unavailable("voice calling is not configured".to_string()))
}

/// POST /api/vapi/calls
pub async fn post_call(
    State(state): State<GatewayState>,
    WithRejection(Json(body), _): WithRejection<Json<OutboundCallRequest>, ApiError>,
) -> ApiResult {
    let phone = body.phone_number.trim();
    if phone.is_empty() {
        return Err(ApiError::BadRequest("phoneNumber is required".to_string()));
    }
    let handle = call_client(&state)?
        .create_call(
            phone,
            CustomerContext {
                name: body.customer_name,
                email: body.customer_email.map(|e| e.to_lowercase()),
            },
        )
        .await?;
    info!(call_id = %handle.id, "booking call initiated");
    ok(Envelope::data(json!({"callId": handle.id, "status": handle.status}))
        .with_message("Booking call initiated successfully"))
}

/// GET /api/vapi/calls/{call_id}
pub async fn get_call(
    State(state): State<GatewayState>,
    WithRejection(Path(call_id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult {
    let call = call_client(&state)?.get_call(&call_id).await?;
    ok(Envelope::data(call))
}

/// GET /api/vapi/calls/history/{phone}
pub async fn get_call_history(
    State(state): State<GatewayState>,
    WithRejection(Path(phone), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult {
    let calls = state.engine.store.list_call_logs_by_phone(&phone).await?;
    ok(Envelope::list(calls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_end_detected_at_root_and_nested() {
        assert!(conversation_ended(&json!({"conversation": {"status": "ended"}})));
        assert!(conversation_ended(
            &json!({"message": {"conversation": {"status": "ended"}}})
        ));
        assert!(!conversation_ended(&json!({"conversation": {"status": "in-progress"}})));
        assert!(!conversation_ended(&json!({})));
    }

    #[test]
    fn outbound_call_request_is_camel_case() {
        let req: OutboundCallRequest = serde_json::from_value(json!({
            "phoneNumber": "+15551234567",
            "customerName": "Jane"
        }))
        .unwrap();
        assert_eq!(req.phone_number, "+15551234567");
        assert_eq!(req.customer_name.as_deref(), Some("Jane"));
        assert!(req.customer_email.is_none());
    }

    #[test]
    fn health_response_serializes_camel_case() {
        let body = HealthResponse {
            status: "ok".into(),
            version: "0.1.0".into(),
            uptime_secs: 42,
            storage: "healthy".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["uptimeSecs"], 42);
        assert_eq!(json["storage"], "healthy");
    }
}
