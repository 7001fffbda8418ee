// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./salonbook.toml` > `~/.config/salonbook/salonbook.toml`
//! > `/etc/salonbook/salonbook.toml` with environment variable overrides via the
//! `SALONBOOK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SalonbookConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/salonbook/salonbook.toml";
pub(crate) const LOCAL_CONFIG_FILE: &str = "salonbook.toml";

/// Sections recognized in `SALONBOOK_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["server", "storage", "booking", "voice", "logging"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/salonbook/salonbook.toml` (system-wide)
/// 3. `~/.config/salonbook/salonbook.toml` (user XDG config)
/// 4. `./salonbook.toml` (local directory)
/// 5. `SALONBOOK_*` environment variables
pub fn load_config() -> Result<SalonbookConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<SalonbookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SalonbookConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("salonbook").join(LOCAL_CONFIG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `SALONBOOK_VOICE_API_KEY` must become `voice.api_key`,
/// not `voice.api.key`.
fn env_provider() -> Env {
    Env::prefixed("SALONBOOK_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}
