// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait definitions.
//!
//! Backends extend the [`Component`] base trait and use `#[async_trait]`
//! so they can be held as `Arc<dyn ...>`.

pub mod adapter;
pub mod storage;
pub mod voice;

pub use adapter::Component;
pub use storage::{BookingStore, SlotFilter};
pub use voice::CallClient;
