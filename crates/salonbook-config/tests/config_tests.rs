// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the salonbook configuration system.

use salonbook_config::diagnostic::ConfigError;
use salonbook_config::model::SalonbookConfig;
use salonbook_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
bind_address = "0.0.0.0"
port = 8080
bearer_token = "secret"
webhook_secret = "hook"

[storage]
database_path = "/tmp/salon.db"
wal_mode = false

[booking]
unknown_customer_name = "Anonymous"
default_service = "Manicure"
default_hour = 10
default_shift_start = "08:30"
default_shift_end = "18:00"

[voice]
enabled = true
api_key = "vapi-key"
assistant_id = "asst-1"
phone_number_id = "pn-1"
timeout_secs = 10

[logging]
level = "debug"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.bearer_token.as_deref(), Some("secret"));
    assert_eq!(config.server.webhook_secret.as_deref(), Some("hook"));
    assert_eq!(config.storage.database_path, "/tmp/salon.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.booking.unknown_customer_name, "Anonymous");
    assert_eq!(config.booking.default_service, "Manicure");
    assert_eq!(config.booking.default_hour, 10);
    // Unset booking keys keep their defaults.
    assert_eq!(config.booking.unknown_phone, "0000000000");
    assert!(config.voice.enabled);
    assert_eq!(config.voice.base_url, "https://api.vapi.ai");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 3100);
    assert!(config.storage.wal_mode);
    assert!(config.storage.database_path.ends_with("salonbook.db"));
    assert_eq!(config.booking.default_hour, 15);
    assert!(!config.voice.enabled);
    assert_eq!(config.voice.timeout_secs, 30);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[booking]
unknown_phnoe = "1111111111"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "unknown_phnoe" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("unknown_phone"));
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[agent]\nname = \"x\"\n").expect_err("should reject");
    let msg = err.to_string();
    assert!(
        msg.contains("unknown field") || msg.contains("agent"),
        "got: {msg}"
    );
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").expect_err("bad type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "{errors:?}"
    );
}

#[test]
fn dotted_override_reaches_underscored_key() {
    use figment::{Figment, providers::Serialized};

    let config: SalonbookConfig = Figment::new()
        .merge(Serialized::defaults(SalonbookConfig::default()))
        .merge(("voice.api_key", "from-env"))
        .merge(("booking.unknown_email", "nobody@salon.test"))
        .extract()
        .expect("dotted keys should merge");

    assert_eq!(config.voice.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.booking.unknown_email, "nobody@salon.test");
}

#[test]
fn validation_errors_surface_through_loader() {
    let toml = r#"
[booking]
default_hour = 30

[voice]
enabled = true
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    let fields: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { field, .. } => Some(field.as_str()),
            _ => None,
        })
        .collect();
    assert!(fields.contains(&"booking.default_hour"));
    assert!(fields.contains(&"voice.api_key"));
    assert!(fields.contains(&"voice.assistant_id"));
    assert!(fields.contains(&"voice.phone_number_id"));
}

#[test]
fn config_file_on_disk_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("salonbook.toml");
    std::fs::write(&path, "[server]\nport = 4000\n").expect("write config");

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.server.port, 4000);
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "prot".to_string(),
        suggestion: Some("port".to_string()),
        valid_keys: "bind_address, port, bearer_token, webhook_secret".to_string(),
        span: None,
        src: None,
    };

    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `port`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("prot"));
}
