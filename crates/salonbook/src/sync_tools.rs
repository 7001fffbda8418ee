// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook sync-tools` command implementation.
//!
//! Pushes the in-call tool definitions to the configured assistant so the
//! voice platform calls back into `/api/vapi/tools/{name}`.

use std::sync::Arc;

use salonbook_config::SalonbookConfig;
use salonbook_core::BookingError;
use salonbook_voice::VapiCallClient;

/// Sync tool definitions to the assistant. Returns the synced names.
pub async fn run_sync_tools(
    config: &SalonbookConfig,
    dry_run: bool,
) -> Result<Vec<String>, BookingError> {
    let definitions = tool_definitions(config).await?;

    if dry_run {
        println!(
            "{}",
            serde_json::to_string_pretty(&definitions).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(definitions
            .iter()
            .filter_map(|d| d["name"].as_str().map(str::to_string))
            .collect());
    }

    let client = VapiCallClient::from_config(&config.voice)?;
    let names = client.sync_tools(&definitions).await?;
    println!("synced {} tool(s): {}", names.len(), names.join(", "));
    Ok(names)
}

/// Definitions from a registry built against an in-memory store.
///
/// Definitions are static, so the store never needs to be the real one.
async fn tool_definitions(
    config: &SalonbookConfig,
) -> Result<Vec<serde_json::Value>, BookingError> {
    let db = salonbook_storage::Database::open_in_memory().await?;
    let store = Arc::new(salonbook_storage::SqliteStorage::from_database(db));
    let engine = salonbook_engine::BookingEngine::new(store, config.booking.clone());
    Ok(engine.tools.definitions())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_lists_tools_without_credentials() {
        let names = run_sync_tools(&SalonbookConfig::default(), true)
            .await
            .unwrap();
        assert!(names.iter().any(|n| n == "bookAppointment"));
        assert!(names.iter().any(|n| n == "getServices"));
    }

    #[tokio::test]
    async fn sync_without_credentials_is_config_error() {
        let err = run_sync_tools(&SalonbookConfig::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Config(_)));
    }
}
