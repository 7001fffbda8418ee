// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text heuristics over call transcripts.
//!
//! Only the caller's side of the conversation is inspected: lines spoken by
//! the assistant repeat catalog names and example phrasing that would
//! otherwise be mistaken for caller data.

use std::sync::LazyLock;

use regex::Regex;

/// Speaker prefixes of assistant lines.
const ASSISTANT_PREFIXES: &[&str] = &["ai:", "assistant:", "bot:"];

/// Speaker prefixes stripped from caller lines.
const CALLER_PREFIXES: &[&str] = &["user:", "customer:", "caller:"];

/// Keyword to service name. Checked in this order; the first keyword found
/// at the start of a word in the caller text wins.
pub const SERVICE_KEYWORDS: &[(&str, &str)] = &[
    ("haircut", "Haircut"),
    ("hair cut", "Haircut"),
    ("manicure", "Manicure"),
    ("pedicure", "Pedicure"),
    ("facial", "Facial"),
    ("massage", "Massage"),
    ("coloring", "Hair Coloring"),
    ("hair coloring", "Hair Coloring"),
    ("hairstyle", "Hair Styling"),
    ("style", "Hair Styling"),
    ("styling", "Hair Styling"),
];

/// Words that end (or disqualify) a name capture.
const NAME_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "the", "at", "to", "for", "from", "with", "here", "just", "i", "my", "me",
    "is", "am", "calling", "looking", "trying", "wondering", "hoping", "wanting", "interested",
    "good", "fine", "great", "okay", "ok", "sorry", "not", "so", "very", "really", "phone",
    "number", "email", "available", "free", "booking", "going", "need", "want", "would", "like",
    "on", "in", "today", "tomorrow", "please", "yes", "no",
];

/// Tokens that mark a capture as something other than the caller's name.
const NON_NAME_TOKENS: &[&str] = &["ai", "assistant", "bot", "salon", "receptionist"];

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bmy name(?:'s| is)\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})",
        r"(?i)\bname\s*:\s*([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})",
        r"(?i)\bthis is\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})",
        r"(?i)\b(?:i'm|i am)\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})",
        r"(?i)\bit's\s+([a-z][a-z'\-]*(?:\s+[a-z][a-z'\-]*){0,2})\s+(?:here|calling)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Labeled: "phone: 555 123 4567", "call me at 555-123-4567".
        r"(?i)(?:phone(?:\s+number)?|number|cell|mobile|call me at|reach me at)\s*(?:is|:)?\s*(\+?[0-9][0-9\s().\-]*[0-9])",
        // Grouped: "(555) 123-4567", "555.123.4567".
        r"(\(?\b[0-9]{3}\)?[\s.\-][0-9]{3}[\s.\-][0-9]{4}\b)",
        // Bare ten digits.
        r"\b([0-9]{10})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b").unwrap());

static SPELLED_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:zero|oh|one|two|three|four|five|six|seven|eight|nine)(?:[\s,\-]+(?:zero|oh|one|two|three|four|five|six|seven|eight|nine)){6,}\b",
    )
    .unwrap()
});

/// The caller's lines, speaker prefixes removed.
pub fn caller_text(transcript: &str) -> String {
    transcript
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            !ASSISTANT_PREFIXES.iter().any(|p| lower.starts_with(p))
        })
        .map(|line| {
            let lower = line.to_lowercase();
            CALLER_PREFIXES
                .iter()
                .find(|p| lower.starts_with(*p))
                .map_or(line, |p| line[p.len()..].trim_start())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Caller name in title case, if a self-introduction is found.
pub fn extract_name(text: &str) -> Option<String> {
    NAME_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .find_map(|caps| clean_name(caps.get(1)?.as_str()))
    })
}

fn clean_name(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !NAME_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    if words.is_empty()
        || words
            .iter()
            .any(|w| NON_NAME_TOKENS.contains(&w.to_lowercase().as_str()))
    {
        return None;
    }
    Some(words.iter().map(|w| title_case(w)).collect::<Vec<_>>().join(" "))
}

/// `"jANE"` becomes `"Jane"`.
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Phone digits from the first matching pattern, spelled-out digits last.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_PATTERNS
        .iter()
        .find_map(|pattern| {
            pattern
                .captures_iter(text)
                .find_map(|caps| non_empty_digits(caps.get(1)?.as_str()))
        })
        .or_else(|| {
            SPELLED_DIGITS
                .find_iter(text)
                .find_map(|m| non_empty_digits(&spelled_to_digits(m.as_str())))
        })
        .map(|digits| clean_phone_digits(&digits))
}

/// `"five five five one two"` becomes `"55512"`. Non-digit words are dropped.
pub fn spelled_to_digits(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter_map(|word| match word.to_lowercase().as_str() {
            "zero" | "oh" => Some('0'),
            "one" => Some('1'),
            "two" => Some('2'),
            "three" => Some('3'),
            "four" => Some('4'),
            "five" => Some('5'),
            "six" => Some('6'),
            "seven" => Some('7'),
            "eight" => Some('8'),
            "nine" => Some('9'),
            _ => None,
        })
        .collect()
}

fn non_empty_digits(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

/// First ten digits when at least ten are present, otherwise all of them.
pub fn clean_phone_digits(digits: &str) -> String {
    let only: String = digits.chars().filter(char::is_ascii_digit).collect();
    if only.len() >= 10 {
        only[..10].to_string()
    } else {
        only
    }
}

/// First address-shaped token, lower-cased.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_lowercase())
}

/// Service for the first keyword (in table order) present in the text.
pub fn detect_service(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    SERVICE_KEYWORDS
        .iter()
        .find(|(keyword, _)| starts_a_word(&lower, keyword))
        .map(|(_, service)| *service)
}

/// True when `keyword` occurs in `text` right after a non-alphanumeric
/// character or at the very start. "lifestyle" does not contain "style".
fn starts_a_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword)
        .any(|(at, _)| !text[..at].chars().next_back().is_some_and(char::is_alphanumeric))
}
