// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Highest-priority extraction: the arguments of a booking tool call made
//! during the conversation.

use super::payload::{CallEnvelope, ToolInvocation};
use super::transcript::clean_phone_digits;
use super::{PartialBooking, parse_datetime};

/// Function name the assistant uses to book.
pub const BOOK_APPOINTMENT: &str = "bookAppointment";

const NAME_KEYS: &[&str] = &["name", "customerName", "customer_name"];
const EMAIL_KEYS: &[&str] = &["email", "customerEmail", "customer_email"];
const PHONE_KEYS: &[&str] = &["phone", "phoneNumber", "phone_number", "customerPhone"];
const SERVICE_KEYS: &[&str] = &["service", "serviceName", "service_name"];
const DATE_KEYS: &[&str] = &["date", "appointmentDate", "appointment_date", "dateTime"];
const TIME_KEYS: &[&str] = &["time", "appointmentTime"];

/// Fields from the first booking invocation in the envelope.
pub fn extract(envelope: &CallEnvelope, default_hour: u32) -> PartialBooking {
    envelope
        .find_tool_call(BOOK_APPOINTMENT)
        .map(|call| from_invocation(call, default_hour))
        .unwrap_or_default()
}

pub fn from_invocation(call: &ToolInvocation, default_hour: u32) -> PartialBooking {
    let appointment_at = call.arg_str(DATE_KEYS).and_then(|date| {
        let combined = call
            .arg_str(TIME_KEYS)
            .filter(|_| !date.contains(['T', ' ']))
            .and_then(|time| parse_datetime(&format!("{date} {time}"), default_hour));
        combined.or_else(|| parse_datetime(&date, default_hour))
    });

    PartialBooking {
        name: call.arg_str(NAME_KEYS),
        email: call.arg_str(EMAIL_KEYS).map(|e| e.to_lowercase()),
        phone: call.arg_str(PHONE_KEYS).map(|raw| clean_phone(&raw)),
        service: call.arg_str(SERVICE_KEYS),
        appointment_at,
    }
}

/// Ten digits when at least ten are present, otherwise the value as spoken.
fn clean_phone(raw: &str) -> String {
    let digits = clean_phone_digits(raw);
    if digits.len() >= 10 {
        digits
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn envelope(arguments: serde_json::Value) -> CallEnvelope {
        CallEnvelope::from_value(&json!({
            "messages": [{"role": "assistant", "toolCalls": [
                {"id": "t1", "function": {"name": "book_appointment", "arguments": arguments.to_string()}}
            ]}]
        }))
    }

    #[test]
    fn arguments_used_as_is() {
        let partial = extract(
            &envelope(json!({
                "name": "Jane Doe",
                "email": "Jane@Example.com",
                "phone": "+1 (555) 123-4567 ext 9",
                "service": "Manicure",
                "date": "2025-03-10T15:00:00"
            })),
            15,
        );
        assert_eq!(partial.name.as_deref(), Some("Jane Doe"));
        assert_eq!(partial.email.as_deref(), Some("jane@example.com"));
        assert_eq!(partial.phone.as_deref(), Some("1555123456"));
        assert_eq!(partial.service.as_deref(), Some("Manicure"));
        assert_eq!(
            partial.appointment_at,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(15, 0, 0)
        );
    }

    #[test]
    fn short_phone_kept_as_given() {
        let partial = extract(&envelope(json!({"phone": "ext 42"})), 15);
        assert_eq!(partial.phone.as_deref(), Some("ext 42"));
    }

    #[test]
    fn separate_time_argument_is_combined() {
        let partial = extract(&envelope(json!({"date": "2025-03-10", "time": "11:30"})), 15);
        assert_eq!(
            partial.appointment_at,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(11, 30, 0)
        );
    }

    #[test]
    fn no_booking_call_yields_nothing() {
        let env = CallEnvelope::from_value(&json!({"functionCall": {"name": "getServices"}}));
        assert_eq!(extract(&env, 15), PartialBooking::default());
    }
}
