// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the salonbook booking backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Top-level salonbook configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SalonbookConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Sentinels and defaults used when call data is missing.
    #[serde(default)]
    pub booking: BookingConfig,

    /// Voice-call platform settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on CRUD routes. `None` rejects every CRUD request.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Shared secret expected in `x-vapi-secret` on voice routes.
    /// `None` leaves those routes open.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            bearer_token: None,
            webhook_secret: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3100
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("salonbook").join("salonbook.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("salonbook.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Placeholder values and fallbacks applied when a call carries no usable data.
///
/// Every sentinel the booking engine compares against lives here so tests and
/// deployments agree on the exact strings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    #[serde(default = "default_unknown_customer_name")]
    pub unknown_customer_name: String,

    #[serde(default = "default_unknown_phone")]
    pub unknown_phone: String,

    #[serde(default = "default_unknown_email")]
    pub unknown_email: String,

    /// Transcript stored when a call event carries none.
    #[serde(default = "default_missing_transcript")]
    pub missing_transcript: String,

    /// Service booked when no service could be extracted.
    #[serde(default = "default_service")]
    pub default_service: String,

    /// Hour of day (local) used when only a date, or nothing, was extracted.
    #[serde(default = "default_hour")]
    pub default_hour: u32,

    #[serde(default = "default_auto_service_duration_minutes")]
    pub auto_service_duration_minutes: i64,

    #[serde(default = "default_auto_service_price")]
    pub auto_service_price: f64,

    #[serde(default = "default_staff_name")]
    pub default_staff_name: String,

    #[serde(default = "default_staff_role")]
    pub default_staff_role: String,

    /// Shift start (`HH:MM`) of the synthesized default staff member.
    #[serde(default = "default_shift_start")]
    pub default_shift_start: String,

    /// Shift end (`HH:MM`) of the synthesized default staff member.
    #[serde(default = "default_shift_end")]
    pub default_shift_end: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            unknown_customer_name: default_unknown_customer_name(),
            unknown_phone: default_unknown_phone(),
            unknown_email: default_unknown_email(),
            missing_transcript: default_missing_transcript(),
            default_service: default_service(),
            default_hour: default_hour(),
            auto_service_duration_minutes: default_auto_service_duration_minutes(),
            auto_service_price: default_auto_service_price(),
            default_staff_name: default_staff_name(),
            default_staff_role: default_staff_role(),
            default_shift_start: default_shift_start(),
            default_shift_end: default_shift_end(),
        }
    }
}

impl BookingConfig {
    /// Parsed default shift, or `None` if either bound is not `HH:MM`.
    pub fn default_shift(&self) -> Option<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.default_shift_start, "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(&self.default_shift_end, "%H:%M").ok()?;
        Some((start, end))
    }

    pub fn is_unknown_name(&self, name: &str) -> bool {
        name == self.unknown_customer_name
    }

    pub fn is_unknown_phone(&self, phone: &str) -> bool {
        phone == self.unknown_phone
    }

    pub fn is_unknown_email(&self, email: &str) -> bool {
        email.eq_ignore_ascii_case(&self.unknown_email)
    }
}

fn default_unknown_customer_name() -> String {
    "Unknown Customer".to_string()
}

fn default_unknown_phone() -> String {
    "0000000000".to_string()
}

fn default_unknown_email() -> String {
    "unknown@example.com".to_string()
}

fn default_missing_transcript() -> String {
    "No transcript provided".to_string()
}

fn default_service() -> String {
    "Haircut".to_string()
}

fn default_hour() -> u32 {
    15
}

fn default_auto_service_duration_minutes() -> i64 {
    60
}

fn default_auto_service_price() -> f64 {
    50.0
}

fn default_staff_name() -> String {
    "Default Stylist".to_string()
}

fn default_staff_role() -> String {
    "Senior Stylist".to_string()
}

fn default_shift_start() -> String {
    "09:00".to_string()
}

fn default_shift_end() -> String {
    "17:00".to_string()
}

/// Voice-call platform configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// Enables outbound calls and tool syncing.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_voice_base_url")]
    pub base_url: String,

    /// Platform API key. Prefer `SALONBOOK_VOICE_API_KEY` over the config file.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub assistant_id: Option<String>,

    /// Caller id used for outbound calls.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default = "default_voice_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_voice_base_url(),
            api_key: None,
            assistant_id: None,
            phone_number_id: None,
            timeout_secs: default_voice_timeout_secs(),
        }
    }
}

fn default_voice_base_url() -> String {
    "https://api.vapi.ai".to_string()
}

fn default_voice_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for salonbook targets (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
