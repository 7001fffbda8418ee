// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook status` command implementation.
//!
//! Queries the gateway health endpoint and reports whether the server is
//! up, its uptime, and store health. Reports "not running" when the
//! endpoint cannot be reached.

use std::io::IsTerminal;
use std::time::Duration;

use salonbook_config::SalonbookConfig;
use salonbook_core::BookingError;
use serde::{Deserialize, Serialize};

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
    storage: String,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub version: Option<String>,
    pub storage: Option<String>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub endpoint: String,
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `salonbook status` command.
pub async fn run_status(config: &SalonbookConfig, json: bool, plain: bool) -> Result<(), BookingError> {
    let endpoint = format!(
        "http://{}:{}/health",
        config.server.bind_address, config.server.port
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| BookingError::Internal(format!("failed to create HTTP client: {e}")))?;

    // The gateway answers 503 with the same body when the store is unhealthy.
    let health = match client.get(&endpoint).send().await {
        Ok(resp) => resp.json::<HealthResponse>().await.ok(),
        Err(_) => None,
    };

    let status = match health {
        Some(h) => StatusResponse {
            running: true,
            uptime_human: Some(format_uptime(h.uptime_secs)),
            status: h.status,
            version: Some(h.version),
            storage: Some(h.storage),
            uptime_secs: Some(h.uptime_secs),
            endpoint,
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            version: None,
            storage: None,
            uptime_secs: None,
            uptime_human: None,
            endpoint,
        },
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  salonbook status");
    println!("  {}", "-".repeat(35));

    if status.running {
        let uptime = status.uptime_human.as_deref().unwrap_or("?");
        if use_color {
            use colored::Colorize;
            println!(
                "    State:    {} {} (uptime: {uptime})",
                "✓".green(),
                status.status.green()
            );
        } else {
            println!("    State:    [OK] {} (uptime: {uptime})", status.status);
        }
        if let Some(version) = &status.version {
            println!("    Version:  {version}");
        }
        if let Some(storage) = &status.storage {
            println!("    Storage:  {storage}");
        }
    } else {
        if use_color {
            use colored::Colorize;
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}", status.endpoint);
        println!();
        println!("  Start with: salonbook serve");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn health_response_reads_gateway_shape() {
        let health: HealthResponse = serde_json::from_str(
            r#"{"status":"ok","version":"0.1.0","uptimeSecs":42,"storage":"healthy"}"#,
        )
        .unwrap();
        assert_eq!(health.uptime_secs, 42);
        assert_eq!(health.storage, "healthy");
    }

    #[test]
    fn offline_status_serializes() {
        let resp = StatusResponse {
            running: false,
            status: "not running".to_string(),
            version: None,
            storage: None,
            uptime_secs: None,
            uptime_human: None,
            endpoint: "http://127.0.0.1:3100/health".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"uptime_secs\":null"));
    }
}
