// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook serve` command implementation.
//!
//! Opens the store, wires the booking engine and (when enabled) the voice
//! client into the gateway, and serves until SIGINT/SIGTERM.

use std::sync::Arc;

use salonbook_config::SalonbookConfig;
use salonbook_core::{BookingError, BookingStore, CallClient, Component};
use salonbook_engine::BookingEngine;
use salonbook_gateway::{AuthConfig, GatewayState, ServerSettings, start_server};
use salonbook_storage::SqliteStorage;
use salonbook_voice::VapiCallClient;
use tracing::{info, warn};

use crate::shutdown;

/// Open and migrate the configured database.
pub async fn open_store(config: &SalonbookConfig) -> Result<Arc<SqliteStorage>, BookingError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage ready");
    Ok(Arc::new(storage))
}

/// Build the gateway state from configuration and an open store.
pub fn gateway_state(
    config: &SalonbookConfig,
    store: Arc<dyn BookingStore>,
) -> Result<GatewayState, BookingError> {
    let engine = BookingEngine::new(store, config.booking.clone());
    let auth = AuthConfig {
        bearer_token: config.server.bearer_token.clone(),
        webhook_secret: config.server.webhook_secret.clone(),
    };
    if auth.bearer_token.is_none() {
        warn!("server.bearer_token is not set; CRUD routes will reject every request");
    }

    let mut state = GatewayState::new(engine, auth);
    if config.voice.enabled {
        let client: Arc<dyn CallClient> = Arc::new(VapiCallClient::from_config(&config.voice)?);
        state = state.with_call_client(client);
    } else {
        info!("voice platform disabled; outbound call routes will return 503");
    }
    Ok(state)
}

/// Run the gateway until a shutdown signal arrives.
pub async fn run_serve(config: SalonbookConfig) -> Result<(), BookingError> {
    let storage = open_store(&config).await?;
    let state = gateway_state(&config, storage.clone())?;

    let settings = ServerSettings {
        host: config.server.bind_address.clone(),
        port: config.server.port,
    };
    let cancel = shutdown::install_signal_handler();
    let shutdown_signal = async move { cancel.cancelled().await };

    start_server(&settings, state, shutdown_signal).await?;

    storage.shutdown().await?;
    info!("salonbook serve shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_config::StorageConfig;

    fn config_in(dir: &tempfile::TempDir) -> SalonbookConfig {
        SalonbookConfig {
            storage: StorageConfig {
                database_path: dir.path().join("serve.db").to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..SalonbookConfig::default()
        }
    }

    #[tokio::test]
    async fn state_without_voice_has_no_call_client() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let store = open_store(&config).await.unwrap();
        let state = gateway_state(&config, store).unwrap();
        assert!(state.calls.is_none());
        assert!(state.auth.bearer_token.is_none());
    }

    #[tokio::test]
    async fn enabled_voice_without_credentials_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.voice.enabled = true;
        let store = open_store(&config).await.unwrap();
        let err = gateway_state(&config, store).err().unwrap();
        assert!(matches!(err, BookingError::Config(_)));
    }
}
