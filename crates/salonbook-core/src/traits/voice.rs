// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound call capability of the voice-call platform.

use async_trait::async_trait;

use crate::error::BookingError;
use crate::traits::adapter::Component;
use crate::types::{CallHandle, CustomerContext};

/// Places and inspects calls on the voice platform.
#[async_trait]
pub trait CallClient: Component {
    /// Starts an assistant call to `phone_number`.
    async fn create_call(
        &self,
        phone_number: &str,
        customer: CustomerContext,
    ) -> Result<CallHandle, BookingError>;

    /// Fetches the platform's view of a call as raw JSON.
    async fn get_call(&self, call_id: &str) -> Result<serde_json::Value, BookingError>;
}
