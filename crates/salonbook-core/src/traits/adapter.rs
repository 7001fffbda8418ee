// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by pluggable backends (store, voice client).

use async_trait::async_trait;

use crate::error::BookingError;
use crate::types::{ComponentType, HealthStatus};

/// Identity, health, and lifecycle for a pluggable backend.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Returns the human-readable name of this component.
    fn name(&self) -> &str;

    /// Returns the semantic version of this component.
    fn version(&self) -> semver::Version;

    fn component_type(&self) -> ComponentType;

    /// Performs a health check and returns the component's current status.
    async fn health_check(&self) -> Result<HealthStatus, BookingError>;

    /// Gracefully shuts down the component, releasing any held resources.
    async fn shutdown(&self) -> Result<(), BookingError>;
}
