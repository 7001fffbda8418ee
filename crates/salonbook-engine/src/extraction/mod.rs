// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-event extraction pipeline.
//!
//! A raw call event is flattened into a [`CallEnvelope`], then an ordered
//! list of extractors each contributes a [`PartialBooking`]. A field set by
//! an earlier extractor is never overwritten by a later one; whatever is
//! still unset afterwards takes its configured default. Nothing in the
//! pipeline fails on missing data.

pub mod payload;
pub mod tool_args;
pub mod transcript;

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use salonbook_config::BookingConfig;
use salonbook_core::normalize_timestamp;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub use payload::{CallEnvelope, ToolInvocation, normalize_function_name};

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum FieldSource {
    ToolCall,
    Transcript,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: FieldSource,
}

/// Fields one extractor could determine. `None` leaves the field open for
/// lower-priority extractors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialBooking {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub appointment_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Sourced<String>,
    pub email: Sourced<String>,
    pub phone: Sourced<String>,
}

/// A call event normalized and ready for resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub call_id: String,
    /// True when the event carried no call id and one was generated.
    pub call_id_synthesized: bool,
    pub event_type: Option<String>,
    pub transcript: String,
    pub cost: Option<f64>,
    pub recording_url: Option<String>,
    pub customer: CustomerInfo,
    pub service_name: Sourced<String>,
    pub appointment_at: Sourced<NaiveDateTime>,
}

type Extractor = fn(&CallEnvelope, &BookingConfig) -> PartialBooking;

/// Extractors in priority order.
const EXTRACTORS: &[(FieldSource, Extractor)] = &[
    (FieldSource::ToolCall, from_tool_call),
    (FieldSource::Transcript, from_transcript),
];

fn from_tool_call(envelope: &CallEnvelope, config: &BookingConfig) -> PartialBooking {
    tool_args::extract(envelope, config.default_hour)
}

fn from_transcript(envelope: &CallEnvelope, _config: &BookingConfig) -> PartialBooking {
    let Some(raw) = envelope.transcript.as_deref() else {
        return PartialBooking::default();
    };
    let text = transcript::caller_text(raw);
    PartialBooking {
        name: transcript::extract_name(&text),
        email: transcript::extract_email(&text),
        phone: transcript::extract_phone(&text),
        service: transcript::detect_service(&text).map(str::to_string),
        appointment_at: None,
    }
}

#[derive(Clone)]
pub struct ExtractionPipeline {
    config: Arc<BookingConfig>,
}

impl ExtractionPipeline {
    pub fn new(config: Arc<BookingConfig>) -> Self {
        Self { config }
    }

    /// Extract relative to the current local time.
    pub fn extract(&self, raw: &Value) -> BookingRequest {
        self.extract_at(raw, Local::now().naive_local())
    }

    /// Extract with `now` as the reference for the default appointment date.
    pub fn extract_at(&self, raw: &Value, now: NaiveDateTime) -> BookingRequest {
        let envelope = CallEnvelope::from_value(raw);
        self.from_envelope(&envelope, now)
    }

    pub fn from_envelope(&self, envelope: &CallEnvelope, now: NaiveDateTime) -> BookingRequest {
        let config = &*self.config;
        let mut name = None;
        let mut email = None;
        let mut phone = None;
        let mut service = None;
        let mut appointment_at = None;

        for (source, extractor) in EXTRACTORS {
            let partial = extractor(envelope, config);
            fill(&mut name, partial.name, *source);
            fill(&mut email, partial.email, *source);
            fill(&mut phone, partial.phone, *source);
            fill(&mut service, partial.service, *source);
            fill(&mut appointment_at, partial.appointment_at, *source);
        }

        let (call_id, call_id_synthesized) = match &envelope.call_id {
            Some(id) => (id.clone(), false),
            None => (synthesize_call_id(), true),
        };

        let request = BookingRequest {
            call_id,
            call_id_synthesized,
            event_type: envelope.event_type.clone(),
            transcript: envelope
                .transcript
                .clone()
                .unwrap_or_else(|| config.missing_transcript.clone()),
            cost: envelope.cost,
            recording_url: envelope.recording_url.clone(),
            customer: CustomerInfo {
                name: or_default(name, || config.unknown_customer_name.clone()),
                email: or_default(email, || config.unknown_email.clone()),
                phone: or_default(phone, || config.unknown_phone.clone()),
            },
            service_name: or_default(service, || config.default_service.clone()),
            appointment_at: or_default(appointment_at, || {
                default_appointment(now.date(), config.default_hour)
            }),
        };

        debug!(
            call_id = %request.call_id,
            name_source = %request.customer.name.source,
            phone_source = %request.customer.phone.source,
            email_source = %request.customer.email.source,
            service = %request.service_name.value,
            service_source = %request.service_name.source,
            at = %request.appointment_at.value,
            at_source = %request.appointment_at.source,
            "call event extracted"
        );
        request
    }
}

fn fill<T>(slot: &mut Option<Sourced<T>>, value: Option<T>, source: FieldSource) {
    if slot.is_none()
        && let Some(value) = value
    {
        *slot = Some(Sourced { value, source });
    }
}

fn or_default<T>(slot: Option<Sourced<T>>, default: impl FnOnce() -> T) -> Sourced<T> {
    slot.unwrap_or_else(|| Sourced {
        value: default(),
        source: FieldSource::Default,
    })
}

/// Tomorrow at `hour`:00.
fn default_appointment(today: NaiveDate, hour: u32) -> NaiveDateTime {
    let tomorrow = today + Duration::days(1);
    tomorrow
        .and_hms_opt(hour.min(23), 0, 0)
        .unwrap_or_else(|| tomorrow.and_time(chrono::NaiveTime::MIN))
}

const CALL_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// `call-<unix millis>-<9 random lower-case alphanumerics>`.
pub fn synthesize_call_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| CALL_ID_ALPHABET[rng.gen_range(0..CALL_ID_ALPHABET.len())] as char)
        .collect();
    format!("call-{}-{suffix}", Utc::now().timestamp_millis())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a caller-supplied date or date-time as local wall-clock time.
///
/// RFC 3339 offsets are dropped, keeping the wall-clock reading. A bare
/// date lands at `default_hour`:00. Sub-second precision is discarded.
pub fn parse_datetime(value: &str, default_hour: u32) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(normalize_timestamp(dt.naive_local()));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(normalize_timestamp(dt));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(default_hour, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pipeline() -> ExtractionPipeline {
        ExtractionPipeline::new(Arc::new(BookingConfig::default()))
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn tool_call_beats_transcript() {
        let raw = json!({
            "message": {
                "type": "end-of-call-report",
                "call": {"id": "call-1"},
                "transcript": "User: Hi, my name is Bob. I want a massage. My email is bob@x.io",
                "artifact": {"messages": [{"role": "assistant", "toolCalls": [{
                    "function": {"name": "bookAppointment",
                        "arguments": {"name": "Jane Doe", "date": "2025-03-10T15:00:00", "service": "Haircut"}}
                }]}]}
            }
        });
        let request = pipeline().extract_at(&raw, now());

        assert_eq!(request.customer.name.value, "Jane Doe");
        assert_eq!(request.customer.name.source, FieldSource::ToolCall);
        assert_eq!(request.service_name.value, "Haircut");
        // Email was not in the tool call, so the transcript fills it.
        assert_eq!(request.customer.email.value, "bob@x.io");
        assert_eq!(request.customer.email.source, FieldSource::Transcript);
        assert_eq!(request.customer.phone.source, FieldSource::Default);
        assert_eq!(request.call_id, "call-1");
        assert!(!request.call_id_synthesized);
    }

    #[test]
    fn empty_event_takes_every_default() {
        let request = pipeline().extract_at(&json!({}), now());
        assert_eq!(request.customer.name.value, "Unknown Customer");
        assert_eq!(request.customer.phone.value, "0000000000");
        assert_eq!(request.customer.email.value, "unknown@example.com");
        assert_eq!(request.service_name.value, "Haircut");
        assert_eq!(request.transcript, "No transcript provided");
        assert_eq!(
            request.appointment_at.value,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap().and_hms_opt(15, 0, 0).unwrap()
        );
        assert_eq!(request.appointment_at.source, FieldSource::Default);
        assert!(request.call_id_synthesized);
        assert!(request.call_id.starts_with("call-"));
    }

    #[test]
    fn synthesized_call_ids_have_expected_shape() {
        let id = synthesize_call_id();
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts[0], "call");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(id, synthesize_call_id());
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(15, 0, 0);
        assert_eq!(parse_datetime("2025-03-10T15:00:00", 9), expected);
        assert_eq!(parse_datetime("2025-03-10T15:00", 9), expected);
        assert_eq!(parse_datetime("2025-03-10 15:00:00", 9), expected);
        assert_eq!(parse_datetime("2025-03-10 15:00", 9), expected);
        assert_eq!(parse_datetime("2025-03-10T15:00:00.123Z", 9), expected);
        assert_eq!(parse_datetime("2025-03-10T15:00:00-05:00", 9), expected);
        assert_eq!(parse_datetime("2025-03-10", 15), expected);
        assert_eq!(parse_datetime("next tuesday", 15), None);
    }

    #[test]
    fn transcript_only_event() {
        let raw = json!({
            "transcript": "AI: Welcome! We offer haircut and facial.\nUser: this is maria lopez, phone 555-010-2030, I'd like a pedicure",
            "callId": "t-9",
            "cost": 0.3
        });
        let request = pipeline().extract_at(&raw, now());
        assert_eq!(request.customer.name.value, "Maria Lopez");
        assert_eq!(request.customer.phone.value, "5550102030");
        assert_eq!(request.service_name.value, "Pedicure");
        assert_eq!(request.service_name.source, FieldSource::Transcript);
        assert_eq!(request.cost, Some(0.3));
    }
}
