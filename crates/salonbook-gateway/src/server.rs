// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use salonbook_core::{BookingError, CallClient};
use salonbook_engine::BookingEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, bearer_auth_middleware, webhook_secret_middleware};
use crate::{crud, handlers};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: BookingEngine,
    /// Outbound call client; `None` when voice is disabled.
    pub calls: Option<Arc<dyn CallClient>>,
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

impl GatewayState {
    pub fn new(engine: BookingEngine, auth: AuthConfig) -> Self {
        Self {
            engine,
            calls: None,
            auth,
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_call_client(mut self, calls: Arc<dyn CallClient>) -> Self {
        self.calls = Some(calls);
        self
    }
}

/// Server bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Build the full router:
/// - `GET /health` (public)
/// - `/api/vapi/*` voice platform routes (webhook secret when configured)
/// - `/api/*` CRUD and outbound-call routes (bearer token)
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let voice_routes = Router::new()
        .route("/api/vapi/webhook", post(handlers::post_webhook))
        .route("/api/vapi/tools/{name}", post(handlers::post_tool))
        .route("/api/vapi/functions", get(handlers::get_functions))
        .route("/api/vapi/services", get(handlers::get_voice_services))
        .route("/api/vapi/staff", get(handlers::get_voice_staff))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state.clone(),
            webhook_secret_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/vapi/calls", post(handlers::post_call))
        .route("/api/vapi/calls/{call_id}", get(handlers::get_call))
        .route(
            "/api/vapi/calls/history/{phone}",
            get(handlers::get_call_history),
        )
        .route(
            "/api/customers",
            post(crud::create_customer).get(crud::list_customers),
        )
        .route("/api/customers/search", get(crud::search_customers))
        .route(
            "/api/customers/{id}",
            get(crud::get_customer)
                .put(crud::update_customer)
                .delete(crud::delete_customer),
        )
        .route(
            "/api/services",
            post(crud::create_service).get(crud::list_services),
        )
        .route("/api/services/duration", get(crud::services_by_duration))
        .route(
            "/api/services/{id}",
            get(crud::get_service)
                .put(crud::update_service)
                .delete(crud::delete_service),
        )
        .route("/api/staff", post(crud::create_staff).get(crud::list_staff))
        .route(
            "/api/staff/{id}",
            get(crud::get_staff)
                .put(crud::update_staff)
                .delete(crud::delete_staff),
        )
        .route("/api/staff/available/{day}", get(crud::schedules_by_day))
        .route(
            "/api/staff/{id}/schedules",
            post(crud::add_schedule).get(crud::list_schedules),
        )
        .route("/api/slots", post(crud::create_slot).get(crud::list_slots))
        .route("/api/slots/available", get(crud::available_slots))
        .route("/api/slots/staff/{staff_id}", get(crud::slots_by_staff))
        .route(
            "/api/slots/{id}",
            get(crud::get_slot)
                .put(crud::update_slot)
                .delete(crud::delete_slot),
        )
        .route("/api/slots/{id}/book", patch(crud::book_slot))
        .route("/api/slots/{id}/free", patch(crud::free_slot))
        .route(
            "/api/appointments",
            post(crud::create_appointment).get(crud::list_appointments),
        )
        .route(
            "/api/appointments/customer/{customer_id}",
            get(crud::appointments_by_customer),
        )
        .route(
            "/api/appointments/staff/{staff_id}",
            get(crud::appointments_by_staff),
        )
        .route(
            "/api/appointments/{id}",
            get(crud::get_appointment)
                .put(crud::update_appointment)
                .delete(crud::delete_appointment),
        )
        .route(
            "/api/appointments/{id}/status",
            patch(crud::update_appointment_status),
        )
        .route("/api/call-logs", get(crud::list_call_logs))
        .route("/api/call-logs/{call_id}", get(crud::get_call_log))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            bearer_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(voice_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    settings: &ServerSettings,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BookingError> {
    let app = build_router(state);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BookingError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BookingError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_debug() {
        let settings = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3100,
        };
        let debug = format!("{settings:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("3100"));
    }
}
