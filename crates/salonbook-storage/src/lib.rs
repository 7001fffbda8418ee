// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the salonbook booking backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and the [`SqliteStorage`]
//! implementation of `BookingStore`.
//!
//! The store enforces the booking invariants itself: a partial unique index
//! allows one active appointment per staff and instant, slots are unique on
//! (staff, date, start), and call logs are unique on the external call id.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
