// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical view over the several shapes a call event can arrive in.
//!
//! The voice platform nests reports under `message` (as an object or a JSON
//! string), scatters conversation turns across `artifact.messages`,
//! `messages`, and `conversation`, and reports tool invocations in at least
//! three differently named arrays. [`CallEnvelope::from_value`] flattens all
//! of that once so extractors only ever look at one structure.

use serde_json::{Map, Value};

/// One function invocation found in a call event.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Platform id used to correlate the result, when present.
    pub id: Option<String>,
    pub name: String,
    /// Argument object. JSON-string arguments are parsed; unparsable ones
    /// become an empty object.
    pub arguments: Value,
}

impl ToolInvocation {
    /// Case- and separator-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        normalize_function_name(&self.name) == normalize_function_name(name)
    }

    /// String argument under the first of `keys` that holds a non-empty value.
    pub fn arg_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| match self.arguments.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// `book_appointment`, `bookAppointment`, and `Book-Appointment` all
/// normalize to `bookappointment`.
pub fn normalize_function_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Flattened call event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallEnvelope {
    /// Event type (`end-of-call-report`, `function-call`, ...).
    pub event_type: Option<String>,
    pub call_id: Option<String>,
    pub transcript: Option<String>,
    pub cost: Option<f64>,
    pub recording_url: Option<String>,
    /// Conversation turns in arrival order across every known location.
    pub messages: Vec<Value>,
    /// Every invocation seen anywhere in the event, history included.
    pub tool_calls: Vec<ToolInvocation>,
    /// Invocations the event itself asks to run: the event-level
    /// `functionCall` and tool-call lists. Never taken from conversation
    /// history.
    pub pending_calls: Vec<ToolInvocation>,
}

impl CallEnvelope {
    pub fn from_value(raw: &Value) -> Self {
        let root = match raw.get("message") {
            Some(Value::Object(inner)) => Some(inner.clone()),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(inner)) => Some(inner),
                _ => {
                    let mut envelope = Self::from_object(raw.as_object());
                    if envelope.transcript.is_none() && !text.trim().is_empty() {
                        envelope.transcript = Some(text.clone());
                    }
                    return envelope;
                }
            },
            _ => None,
        };
        match root {
            Some(inner) => Self::from_object(Some(&inner)).fill_from(raw.as_object()),
            None => Self::from_object(raw.as_object()),
        }
    }

    fn from_object(obj: Option<&Map<String, Value>>) -> Self {
        let Some(obj) = obj else {
            return Self::default();
        };
        let artifact = obj.get("artifact");
        let call = obj.get("call");

        let mut messages = Vec::new();
        for source in [
            artifact.and_then(|a| a.get("messages")),
            obj.get("messages"),
            obj.get("conversation")
                .and_then(|c| if c.is_array() { Some(c) } else { c.get("messages") }),
        ]
        .into_iter()
        .flatten()
        {
            if let Value::Array(items) = source {
                messages.extend(items.iter().cloned());
            }
        }

        let event_calls = invocations_in(&Value::Object(obj.clone()));
        let function_call = obj.get("functionCall").and_then(invocation_from);

        let mut tool_calls = event_calls.clone();
        for message in &messages {
            tool_calls.extend(invocations_in(message));
        }
        tool_calls.extend(function_call.clone());

        let mut pending_calls = event_calls;
        pending_calls.extend(function_call);

        let transcript = non_empty_str(obj.get("transcript"))
            .or_else(|| non_empty_str(artifact.and_then(|a| a.get("transcript"))))
            .or_else(|| synthesize_transcript(&messages));

        Self {
            event_type: non_empty_str(obj.get("type")),
            call_id: non_empty_str(call.and_then(|c| c.get("id")))
                .or_else(|| non_empty_str(obj.get("callId")))
                .or_else(|| non_empty_str(obj.get("call_id"))),
            transcript,
            cost: number(obj.get("cost")).or_else(|| number(call.and_then(|c| c.get("cost")))),
            recording_url: non_empty_str(obj.get("recordingUrl"))
                .or_else(|| non_empty_str(artifact.and_then(|a| a.get("recordingUrl"))))
                .or_else(|| non_empty_str(call.and_then(|c| c.get("recordingUrl")))),
            messages,
            tool_calls,
            pending_calls,
        }
    }

    /// Fill fields the nested message left unset from the outer object.
    fn fill_from(mut self, outer: Option<&Map<String, Value>>) -> Self {
        let outer = Self::from_object(outer);
        self.event_type = self.event_type.or(outer.event_type);
        self.call_id = self.call_id.or(outer.call_id);
        self.transcript = self.transcript.or(outer.transcript);
        self.cost = self.cost.or(outer.cost);
        self.recording_url = self.recording_url.or(outer.recording_url);
        if self.messages.is_empty() {
            self.messages = outer.messages;
        }
        if self.tool_calls.is_empty() {
            self.tool_calls = outer.tool_calls;
        }
        if self.pending_calls.is_empty() {
            self.pending_calls = outer.pending_calls;
        }
        self
    }

    /// First invocation of the named function.
    pub fn find_tool_call(&self, name: &str) -> Option<&ToolInvocation> {
        self.tool_calls.iter().find(|t| t.is_named(name))
    }
}

const TOOL_CALL_KEYS: &[&str] = &["toolCalls", "tool_calls", "toolCallList"];

fn invocations_in(value: &Value) -> Vec<ToolInvocation> {
    TOOL_CALL_KEYS
        .iter()
        .filter_map(|key| value.get(*key)?.as_array())
        .flatten()
        .filter_map(invocation_from)
        .collect()
}

/// Accepts `{id, function: {name, arguments}}` as well as the flat
/// `{name, arguments | parameters}` form.
fn invocation_from(value: &Value) -> Option<ToolInvocation> {
    let body = value.get("function").unwrap_or(value);
    let name = non_empty_str(body.get("name"))?;
    let arguments = body
        .get("arguments")
        .or_else(|| body.get("parameters"))
        .map(parse_arguments)
        .unwrap_or_else(|| Value::Object(Map::new()));
    Some(ToolInvocation {
        id: non_empty_str(value.get("id")),
        name,
        arguments,
    })
}

fn parse_arguments(raw: &Value) -> Value {
    match raw {
        Value::Object(_) => raw.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ Value::Object(_)) => parsed,
            _ => Value::Object(Map::new()),
        },
        _ => Value::Object(Map::new()),
    }
}

/// Rebuild a transcript as `Speaker: text` lines from role/content turns.
fn synthesize_transcript(messages: &[Value]) -> Option<String> {
    let lines: Vec<String> = messages
        .iter()
        .filter_map(|m| {
            let role = m.get("role")?.as_str()?;
            let text = non_empty_str(m.get("content"))
                .or_else(|| non_empty_str(m.get("message")))?;
            let speaker = match role {
                "assistant" | "bot" => "AI",
                "user" | "customer" => "User",
                _ => return None,
            };
            Some(format!("{speaker}: {text}"))
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
