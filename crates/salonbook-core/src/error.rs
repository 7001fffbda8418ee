// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the salonbook booking backend.

use thiserror::Error;

/// The primary error type used across all salonbook crates.
///
/// Missing or ambiguous caller input is never represented here: the engine
/// resolves it to sentinels, defaults, or auto-created records instead.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The staff member already has an active appointment at that exact instant.
    #[error("staff #{staff_id} is already booked at {at}")]
    Conflict { staff_id: i64, at: String },

    /// Malformed caller input (unparseable date, unknown status value).
    #[error("invalid input: {0}")]
    Validation(String),

    /// Voice-call platform errors (HTTP failure, unexpected response).
    #[error("voice platform error: {message}")]
    Voice {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A call event could not be turned into a booking.
    #[error("failed to process call {call_id}: {source}")]
    CallProcessing {
        call_id: String,
        source: Box<BookingError>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Shorthand for a `NotFound` error keyed by a numeric id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
