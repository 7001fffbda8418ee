// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-event payloads in the shapes the voice platform delivers.

use serde_json::{Value, json};

/// `end-of-call-report` with a transcript and a `bookAppointment` tool call
/// inside `artifact.messages`.
pub fn end_of_call_report(call_id: &str, transcript: &str, booking: Value) -> Value {
    json!({
        "message": {
            "type": "end-of-call-report",
            "call": {"id": call_id, "cost": 0.42},
            "transcript": transcript,
            "recordingUrl": format!("https://recordings.example.com/{call_id}.wav"),
            "artifact": {
                "messages": [
                    {"role": "assistant", "message": "Thanks for calling, how can I help?"},
                    {
                        "role": "tool_calls",
                        "toolCalls": [{
                            "id": format!("tc-{call_id}"),
                            "type": "function",
                            "function": {
                                "name": "bookAppointment",
                                "arguments": booking.to_string()
                            }
                        }]
                    }
                ]
            }
        }
    })
}

/// `end-of-call-report` carrying only a transcript.
pub fn transcript_only_report(call_id: &str, transcript: &str) -> Value {
    json!({
        "message": {
            "type": "end-of-call-report",
            "call": {"id": call_id},
            "transcript": transcript
        }
    })
}

/// Legacy `function-call` event.
pub fn function_call(name: &str, parameters: Value) -> Value {
    json!({
        "type": "function-call",
        "functionCall": {"name": name, "parameters": parameters}
    })
}

/// `tool-calls` event with one entry per `(id, name, arguments)`.
pub fn tool_calls(calls: &[(&str, &str, Value)]) -> Value {
    let list: Vec<Value> = calls
        .iter()
        .map(|(id, name, args)| {
            json!({
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": args}
            })
        })
        .collect();
    json!({
        "message": {
            "type": "tool-calls",
            "toolCallList": list
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_embeds_stringified_arguments() {
        let payload = end_of_call_report("c1", "hi", json!({"name": "Jane"}));
        let args = &payload["message"]["artifact"]["messages"][1]["toolCalls"][0]["function"]
            ["arguments"];
        assert!(args.as_str().unwrap().contains("Jane"));
    }

    #[test]
    fn tool_calls_keep_ids() {
        let payload = tool_calls(&[("t1", "getServices", json!({}))]);
        assert_eq!(payload["message"]["toolCallList"][0]["id"], "t1");
    }
}
