// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express. All errors are
//! collected; validation does not stop at the first failure.

use chrono::NaiveTime;

use crate::diagnostic::ConfigError;
use crate::model::SalonbookConfig;

/// Upper bound for placeholder service durations: one day.
const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Validate a deserialized configuration.
pub fn validate_config(config: &SalonbookConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::invalid(
            "server.bind_address",
            "must not be empty",
        ));
    } else if addr.parse::<std::net::IpAddr>().is_err()
        && !addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(
            "server.bind_address",
            format!("`{addr}` is not a valid IP address or hostname"),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    validate_booking(config, &mut errors);
    validate_voice(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_booking(config: &SalonbookConfig, errors: &mut Vec<ConfigError>) {
    let booking = &config.booking;

    for (field, value) in [
        ("booking.unknown_customer_name", &booking.unknown_customer_name),
        ("booking.unknown_phone", &booking.unknown_phone),
        ("booking.unknown_email", &booking.unknown_email),
        ("booking.missing_transcript", &booking.missing_transcript),
        ("booking.default_service", &booking.default_service),
        ("booking.default_staff_name", &booking.default_staff_name),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::invalid(field, "must not be empty"));
        }
    }

    if booking.default_hour > 23 {
        errors.push(ConfigError::invalid(
            "booking.default_hour",
            format!("must be between 0 and 23, got {}", booking.default_hour),
        ));
    }

    if !(1..=MAX_DURATION_MINUTES).contains(&booking.auto_service_duration_minutes) {
        errors.push(ConfigError::invalid(
            "booking.auto_service_duration_minutes",
            format!(
                "must be between 1 and {MAX_DURATION_MINUTES}, got {}",
                booking.auto_service_duration_minutes
            ),
        ));
    }

    if booking.auto_service_price.is_nan() || booking.auto_service_price < 0.0 {
        errors.push(ConfigError::invalid(
            "booking.auto_service_price",
            format!("must be non-negative, got {}", booking.auto_service_price),
        ));
    }

    let start = parse_hhmm("booking.default_shift_start", &booking.default_shift_start, errors);
    let end = parse_hhmm("booking.default_shift_end", &booking.default_shift_end, errors);
    if let (Some(start), Some(end)) = (start, end)
        && start >= end
    {
        errors.push(ConfigError::invalid(
            "booking.default_shift_start",
            format!(
                "shift must start before it ends ({} >= {})",
                booking.default_shift_start, booking.default_shift_end
            ),
        ));
    }
}

fn parse_hhmm(field: &str, value: &str, errors: &mut Vec<ConfigError>) -> Option<NaiveTime> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(time) => Some(time),
        Err(_) => {
            errors.push(ConfigError::invalid(
                field,
                format!("`{value}` is not a HH:MM time"),
            ));
            None
        }
    }
}

fn validate_voice(config: &SalonbookConfig, errors: &mut Vec<ConfigError>) {
    let voice = &config.voice;

    if voice.timeout_secs == 0 {
        errors.push(ConfigError::invalid("voice.timeout_secs", "must be positive"));
    }

    if !voice.enabled {
        return;
    }

    for (field, value) in [
        ("voice.api_key", &voice.api_key),
        ("voice.assistant_id", &voice.assistant_id),
        ("voice.phone_number_id", &voice.phone_number_id),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::invalid(
                field,
                "is required when voice.enabled = true",
            ));
        }
    }
}
