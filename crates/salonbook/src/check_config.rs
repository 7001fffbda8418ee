// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook check-config` command implementation.
//!
//! Runs diagnostic checks against an already-validated configuration:
//! database reachability, gateway credentials, and voice platform
//! credentials.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use salonbook_config::SalonbookConfig;
use salonbook_core::BookingError;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print the results.
///
/// Returns an error when any check fails so the process exits non-zero.
pub async fn run_check_config(config: &SalonbookConfig, plain: bool) -> Result<(), BookingError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  salonbook check-config");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", render_line(result, use_color));
    }
    println!();

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warned = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();

    if failed == 0 && warned == 0 {
        println!("  All checks passed.");
    } else {
        let issues = failed + warned;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    }
    println!();

    if failed > 0 {
        return Err(BookingError::Config(format!("{failed} check(s) failed")));
    }
    Ok(())
}

/// Run all checks without printing.
pub async fn collect_checks(config: &SalonbookConfig) -> Vec<CheckResult> {
    vec![
        check_database(&config.storage.database_path).await,
        check_gateway_auth(config),
        check_voice(config),
    ]
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!(
            "    {symbol} {:<20} {message} ({duration_ms}ms)",
            result.name
        )
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// Check the database file can be opened and queried.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let name = "Database";

    if db_path == ":memory:" {
        return CheckResult::new(name, CheckStatus::Warn, "in-memory (data is not persisted)", start);
    }
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            name,
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, format!("open failed: {e}"), start),
    };

    let tables: Result<i64, tokio_rusqlite::Error<rusqlite::Error>> = conn
        .call(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'appointments'",
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await;

    match tables {
        Ok(0) => CheckResult::new(name, CheckStatus::Warn, "schema not migrated yet", start),
        Ok(_) => CheckResult::new(name, CheckStatus::Pass, "connected", start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

fn check_gateway_auth(config: &SalonbookConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Gateway auth";
    match (&config.server.bearer_token, &config.server.webhook_secret) {
        (None, _) => CheckResult::new(
            name,
            CheckStatus::Warn,
            "no bearer_token; CRUD routes reject every request",
            start,
        ),
        (Some(_), None) => CheckResult::new(
            name,
            CheckStatus::Warn,
            "no webhook_secret; voice routes are unauthenticated",
            start,
        ),
        (Some(_), Some(_)) => CheckResult::new(name, CheckStatus::Pass, "configured", start),
    }
}

fn check_voice(config: &SalonbookConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Voice platform";
    let voice = &config.voice;
    if !voice.enabled {
        return CheckResult::new(name, CheckStatus::Pass, "disabled", start);
    }

    let missing: Vec<&str> = [
        ("api_key", &voice.api_key),
        ("assistant_id", &voice.assistant_id),
        ("phone_number_id", &voice.phone_number_id),
    ]
    .into_iter()
    .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
    .map(|(key, _)| key)
    .collect();

    if missing.is_empty() {
        CheckResult::new(name, CheckStatus::Pass, format!("enabled ({})", voice.base_url), start)
    } else {
        CheckResult::new(
            name,
            CheckStatus::Fail,
            format!("missing voice.{}", missing.join(", voice.")),
            start,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_config::StorageConfig;

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result = check_database(&path.to_string_lossy()).await;
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("will be created"));
    }

    #[tokio::test]
    async fn migrated_database_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salon.db").to_string_lossy().to_string();
        let storage = salonbook_storage::SqliteStorage::new(StorageConfig {
            database_path: path.clone(),
            wal_mode: true,
        });
        storage.initialize().await.unwrap();

        let result = check_database(&path).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
    }

    #[test]
    fn voice_enabled_without_credentials_fails() {
        let mut config = SalonbookConfig::default();
        config.voice.enabled = true;
        config.voice.api_key = Some("key".into());

        let result = check_voice(&config);
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(
            result.message,
            "missing voice.assistant_id, voice.phone_number_id"
        );
    }

    #[test]
    fn voice_disabled_passes() {
        let result = check_voice(&SalonbookConfig::default());
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[test]
    fn gateway_without_token_warns() {
        let result = check_gateway_auth(&SalonbookConfig::default());
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn plain_render_uses_tags() {
        let line = render_line(
            &CheckResult {
                name: "Database".into(),
                status: CheckStatus::Fail,
                message: "open failed".into(),
                duration: Duration::from_millis(3),
            },
            false,
        );
        assert!(line.starts_with("    [FAIL] Database"));
        assert!(line.ends_with("open failed (3ms)"));
    }
}
