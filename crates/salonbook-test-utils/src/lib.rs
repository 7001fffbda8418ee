// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for salonbook integration tests.
//!
//! Provides a mock call client, call-event fixtures, and a harness that
//! drives the full HTTP stack against a throwaway database, without
//! external services.
//!
//! # Components
//!
//! - [`TestHarness`] - temp SQLite store, seeded catalog, engine, and router
//! - [`MockCallClient`] - outbound call client that records placed calls
//! - [`fixtures`] - webhook payloads in the platform's event shapes

pub mod fixtures;
pub mod harness;
pub mod mock_call_client;

pub use harness::{TEST_TOKEN, TestHarness};
pub use mock_call_client::MockCallClient;
