// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for salonbook.
//!
//! Serves the voice platform webhook and in-call tool routes, the CRUD API
//! over every booking entity, and a public health check. All JSON bodies use
//! the `{success, message?, data?, count?}` envelope from [`response`].

pub mod auth;
pub mod crud;
pub mod handlers;
pub mod response;
pub mod server;

pub use auth::AuthConfig;
pub use response::{ApiError, Envelope};
pub use server::{GatewayState, ServerSettings, build_router, start_server};
