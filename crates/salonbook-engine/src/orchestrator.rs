// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives one call event to at most one appointment and exactly one call log.
//!
//! States: `RECEIVED -> EXTRACTED -> {RESOLVED | NO_CUSTOMER_DATA} ->
//! {BOOKED | CONFLICT} -> [SLOT_WARNING] -> LOGGED`, with `FAILED` on any
//! error. Redelivery of a call id that already produced an appointment is a
//! replay: the log is refreshed and nothing is resolved or created.
//!
//! Deliveries sharing a call id are processed one at a time, so a redelivery
//! that races the original waits for it and then replays.

use std::sync::Arc;

use dashmap::DashMap;

use salonbook_config::BookingConfig;
use salonbook_core::{
    Appointment, AppointmentStatus, BookingError, BookingStore, CallLog, CallLogRecord,
    CallStatus, Customer, NewAppointment, Service, Staff,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::availability::{AvailabilityEngine, end_time};
use crate::extraction::{BookingRequest, ExtractionPipeline};
use crate::display_datetime;
use crate::resolver::EntityResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Received,
    Extracted,
    Resolved,
    NoCustomerData,
    Booked,
    Conflict,
    SlotWarning,
    Logged,
    Failed,
}

/// How a processed call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallDisposition {
    /// A new appointment was created.
    Booked,
    /// The call id had already produced an appointment.
    Replayed,
    /// No caller identity; nothing was booked.
    NoBooking,
    /// The staff member was already booked at the requested instant.
    Conflict,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    pub call_id: String,
    pub disposition: CallDisposition,
    pub appointment: Option<Appointment>,
    pub call_log: CallLog,
    pub customer: Option<Customer>,
    pub service: Option<Service>,
    pub staff: Option<Staff>,
    pub slot_reserved: bool,
    pub states: Vec<BookingState>,
}

impl CallOutcome {
    pub fn replayed(&self) -> bool {
        self.disposition == CallDisposition::Replayed
    }

    /// Human-readable summary for the webhook response.
    pub fn message(&self) -> String {
        match (self.disposition, &self.appointment) {
            (CallDisposition::Booked, Some(appointment)) => format!(
                "Appointment booked for {} on {} for {} with {}",
                self.customer.as_ref().map_or("customer", |c| c.name.as_str()),
                display_datetime(appointment.appointment_at),
                self.service.as_ref().map_or("service", |s| s.name.as_str()),
                self.staff.as_ref().map_or("staff", |s| s.name.as_str()),
            ),
            (CallDisposition::Replayed, Some(appointment)) => format!(
                "Call {} already processed; appointment #{} unchanged",
                self.call_id, appointment.id
            ),
            (CallDisposition::Conflict, _) => match &self.staff {
                Some(staff) => format!(
                    "Staff #{} ({}) is already booked at that time; no appointment created",
                    staff.id, staff.name
                ),
                None => "Requested time is already booked; no appointment created".to_string(),
            },
            _ => "Call completed but no booking: the caller could not be identified".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct BookingOrchestrator {
    store: Arc<dyn BookingStore>,
    config: Arc<BookingConfig>,
    extraction: ExtractionPipeline,
    resolver: EntityResolver,
    availability: AvailabilityEngine,
    /// One lock per call id currently being processed.
    in_flight: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl BookingOrchestrator {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<BookingConfig>) -> Self {
        Self {
            extraction: ExtractionPipeline::new(config.clone()),
            resolver: EntityResolver::new(store.clone(), config.clone()),
            availability: AvailabilityEngine::new(store.clone()),
            in_flight: Arc::new(DashMap::new()),
            store,
            config,
        }
    }

    /// Extract and process a raw call event.
    pub async fn process_call(&self, raw: &Value) -> Result<CallOutcome, BookingError> {
        let request = self.extraction.extract(raw);
        self.process_request(request).await
    }

    /// Process an already extracted request.
    ///
    /// Errors are recorded as a `failed` call log (best effort) and returned
    /// wrapped in [`BookingError::CallProcessing`].
    pub async fn process_request(
        &self,
        request: BookingRequest,
    ) -> Result<CallOutcome, BookingError> {
        let mut states = vec![BookingState::Received, BookingState::Extracted];
        debug!(call_id = %request.call_id, state = %BookingState::Extracted, "call event extracted");

        let lock = self
            .in_flight
            .entry(request.call_id.clone())
            .or_default()
            .value()
            .clone();
        let guard = lock.lock().await;
        let result = self.run(&request, &mut states).await;
        if let Err(e) = &result {
            error!(call_id = %request.call_id, state = %BookingState::Failed, error = %e, "call processing failed");
            self.record_failure(&request).await;
        }
        drop(guard);
        // Only the map and this delivery still hold the lock: nobody is waiting.
        self.in_flight.remove_if(&request.call_id, |_, held| {
            Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2
        });

        match result {
            Ok(outcome) => {
                info!(
                    call_id = %outcome.call_id,
                    disposition = ?outcome.disposition,
                    appointment_id = ?outcome.appointment.as_ref().map(|a| a.id),
                    "call processed"
                );
                Ok(outcome)
            }
            Err(e) => Err(BookingError::CallProcessing {
                call_id: request.call_id.clone(),
                source: Box::new(e),
            }),
        }
    }

    async fn run(
        &self,
        request: &BookingRequest,
        states: &mut Vec<BookingState>,
    ) -> Result<CallOutcome, BookingError> {
        if let Some(outcome) = self.replay(request, states).await? {
            return Ok(outcome);
        }

        let info = &request.customer;
        if self.config.is_unknown_name(&info.name.value) {
            transition(request, states, BookingState::NoCustomerData);
            let phone = (!self.config.is_unknown_phone(&info.phone.value))
                .then(|| info.phone.value.clone());
            let call_log = self
                .log_call(request, CallStatus::CompletedNoBooking, phone, None)
                .await?;
            transition(request, states, BookingState::Logged);
            return Ok(CallOutcome {
                call_id: request.call_id.clone(),
                disposition: CallDisposition::NoBooking,
                appointment: None,
                call_log,
                customer: None,
                service: None,
                staff: None,
                slot_reserved: false,
                states: std::mem::take(states),
            });
        }

        let customer = self
            .resolver
            .resolve_customer(
                Some(&info.name.value),
                Some(&info.email.value),
                Some(&info.phone.value),
            )
            .await?;
        let service = self
            .resolver
            .resolve_service(Some(&request.service_name.value))
            .await?;
        let at = request.appointment_at.value;
        let staff = self.resolver.resolve_staff(at).await?;
        transition(request, states, BookingState::Resolved);

        let booked = self
            .availability
            .book(NewAppointment {
                customer_id: customer.id,
                service_id: service.id,
                staff_id: staff.id,
                appointment_at: at,
                status: AppointmentStatus::Confirmed,
            })
            .await?;

        let Some(appointment) = booked else {
            // The caller's own booking, committed by an earlier delivery whose
            // call log was never written.
            if let Some(existing) = self.availability.active_at(staff.id, at).await?
                && existing.customer_id == customer.id
                && existing.service_id == service.id
            {
                debug!(
                    call_id = %request.call_id,
                    appointment_id = existing.id,
                    "adopting existing appointment"
                );
                let call_log = self
                    .log_call(
                        request,
                        CallStatus::Completed,
                        Some(customer.phone.clone()),
                        Some(existing.id),
                    )
                    .await?;
                transition(request, states, BookingState::Logged);
                return Ok(CallOutcome {
                    call_id: request.call_id.clone(),
                    disposition: CallDisposition::Replayed,
                    appointment: Some(existing),
                    call_log,
                    customer: Some(customer),
                    service: Some(service),
                    staff: Some(staff),
                    slot_reserved: false,
                    states: std::mem::take(states),
                });
            }

            transition(request, states, BookingState::Conflict);
            warn!(call_id = %request.call_id, staff_id = staff.id, %at, "staff already booked");
            let call_log = self
                .log_call(
                    request,
                    CallStatus::CompletedConflict,
                    Some(customer.phone.clone()),
                    None,
                )
                .await?;
            transition(request, states, BookingState::Logged);
            return Ok(CallOutcome {
                call_id: request.call_id.clone(),
                disposition: CallDisposition::Conflict,
                appointment: None,
                call_log,
                customer: Some(customer),
                service: Some(service),
                staff: Some(staff),
                slot_reserved: false,
                states: std::mem::take(states),
            });
        };
        transition(request, states, BookingState::Booked);

        let call_log = self
            .log_call(
                request,
                CallStatus::Completed,
                Some(customer.phone.clone()),
                Some(appointment.id),
            )
            .await?;

        let slot = match end_time(appointment.appointment_at, service.duration) {
            Some(end) => {
                self.availability
                    .reserve_slot(staff.id, appointment.appointment_at, end)
                    .await
            }
            None => {
                warn!(
                    call_id = %request.call_id,
                    duration = service.duration,
                    "appointment end out of range; slot not reserved"
                );
                None
            }
        };
        if slot.is_none() {
            transition(request, states, BookingState::SlotWarning);
        }
        transition(request, states, BookingState::Logged);

        Ok(CallOutcome {
            call_id: request.call_id.clone(),
            disposition: CallDisposition::Booked,
            appointment: Some(appointment),
            call_log,
            customer: Some(customer),
            service: Some(service),
            staff: Some(staff),
            slot_reserved: slot.is_some(),
            states: std::mem::take(states),
        })
    }

    /// Short-circuit a redelivered call that already has its appointment.
    async fn replay(
        &self,
        request: &BookingRequest,
        states: &mut Vec<BookingState>,
    ) -> Result<Option<CallOutcome>, BookingError> {
        if request.call_id_synthesized {
            return Ok(None);
        }
        let Some(existing) = self.store.get_call_log(&request.call_id).await? else {
            return Ok(None);
        };
        let Some(appointment_id) = existing.appointment_id else {
            return Ok(None);
        };
        let Some(appointment) = self.store.get_appointment(appointment_id).await? else {
            return Ok(None);
        };

        debug!(call_id = %request.call_id, appointment_id, "replaying processed call");
        let call_log = self
            .log_call(request, existing.status, None, Some(appointment_id))
            .await?;
        transition(request, states, BookingState::Logged);

        Ok(Some(CallOutcome {
            call_id: request.call_id.clone(),
            disposition: CallDisposition::Replayed,
            customer: self.store.get_customer(appointment.customer_id).await?,
            service: self.store.get_service(appointment.service_id).await?,
            staff: self.store.get_staff(appointment.staff_id).await?,
            appointment: Some(appointment),
            call_log,
            slot_reserved: false,
            states: std::mem::take(states),
        }))
    }

    async fn log_call(
        &self,
        request: &BookingRequest,
        status: CallStatus,
        phone_number: Option<String>,
        appointment_id: Option<i64>,
    ) -> Result<CallLog, BookingError> {
        self.store
            .upsert_call_log(CallLogRecord {
                call_id: request.call_id.clone(),
                phone_number,
                transcript: request.transcript.clone(),
                recording_url: request.recording_url.clone(),
                cost: request.cost,
                status,
                appointment_id,
            })
            .await
    }

    async fn record_failure(&self, request: &BookingRequest) {
        if let Err(e) = self
            .log_call(request, CallStatus::Failed, None, None)
            .await
        {
            error!(call_id = %request.call_id, error = %e, "failed to record failed call");
        }
    }
}

fn transition(request: &BookingRequest, states: &mut Vec<BookingState>, state: BookingState) {
    debug!(call_id = %request.call_id, %state, "booking state");
    states.push(state);
}
