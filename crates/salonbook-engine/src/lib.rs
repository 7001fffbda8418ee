// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking engine for salonbook.
//!
//! Four layers, leaf first:
//! - [`resolver`]: find-or-create customers, services, and staff from
//!   partial input.
//! - [`availability`]: exact-instant conflict detection, schedule checks,
//!   and the best-effort slot projection.
//! - [`extraction`]: turns any supported call-event shape into a
//!   [`BookingRequest`](extraction::BookingRequest).
//! - [`orchestrator`]: processes one call event into at most one
//!   appointment and one call log, idempotently per call id.
//!
//! [`tools`] exposes the in-call functions the voice assistant invokes and
//! [`catalog`] holds the default service and staff data.

pub mod availability;
pub mod catalog;
pub mod extraction;
pub mod orchestrator;
pub mod resolver;
pub mod tools;

use std::sync::Arc;

use chrono::NaiveDateTime;
use salonbook_config::BookingConfig;
use salonbook_core::BookingStore;

pub use availability::{Alternatives, AvailabilityEngine};
pub use extraction::{BookingRequest, ExtractionPipeline, FieldSource};
pub use orchestrator::{BookingOrchestrator, BookingState, CallDisposition, CallOutcome};
pub use resolver::EntityResolver;
pub use tools::{BookingTool, ToolRegistry};

/// `Monday, March 10, 2025 at 3:00 PM`
pub fn display_datetime(at: NaiveDateTime) -> String {
    at.format("%A, %B %-d, %Y at %-I:%M %p").to_string()
}

/// Every engine component wired to one store and one set of booking defaults.
#[derive(Clone)]
pub struct BookingEngine {
    pub store: Arc<dyn BookingStore>,
    pub config: Arc<BookingConfig>,
    pub resolver: EntityResolver,
    pub availability: AvailabilityEngine,
    pub extraction: ExtractionPipeline,
    pub orchestrator: BookingOrchestrator,
    pub tools: Arc<ToolRegistry>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, config: BookingConfig) -> Self {
        let config = Arc::new(config);
        let resolver = EntityResolver::new(store.clone(), config.clone());
        let availability = AvailabilityEngine::new(store.clone());
        let tools = ToolRegistry::booking_tools(
            store.clone(),
            resolver.clone(),
            availability.clone(),
            config.default_hour,
        );
        Self {
            extraction: ExtractionPipeline::new(config.clone()),
            orchestrator: BookingOrchestrator::new(store.clone(), config.clone()),
            tools: Arc::new(tools),
            resolver,
            availability,
            store,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn datetime_display() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert_eq!(display_datetime(at), "Monday, March 10, 2025 at 3:00 PM");
    }
}
