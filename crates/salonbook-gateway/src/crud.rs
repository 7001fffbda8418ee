// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD handlers for customers, services, staff, slots, appointments, and
//! call logs.
//!
//! Thin pass-throughs to the store and the booking engine. Creation of an
//! appointment goes through the same conflict-checked path as the voice
//! tools.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use salonbook_core::{
    AppointmentStatus, AppointmentUpdate, BookingError, CustomerUpdate, DayOfWeek,
    MAX_SERVICE_DURATION_MINUTES, NewAppointment, NewCustomer, NewSchedule, NewService,
    NewSlot, NewStaff, ServiceUpdate, SlotFilter, SlotUpdate, StaffUpdate,
};
use salonbook_engine::display_datetime;
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::info;

use crate::response::{ApiError, ApiResult, Envelope, created, ok};
use crate::server::GatewayState;

type IdPath = WithRejection<Path<i64>, ApiError>;
type Body<T> = WithRejection<Json<T>, ApiError>;
type QueryOf<T> = WithRejection<Query<T>, ApiError>;

fn found<T>(value: Option<T>, entity: &'static str, id: impl ToString) -> Result<T, ApiError> {
    value.ok_or_else(|| BookingError::not_found(entity, id).into())
}

fn invalid(message: impl Into<String>) -> ApiError {
    BookingError::Validation(message.into()).into()
}

// --- customers ---

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn create_customer(
    State(state): State<GatewayState>,
    WithRejection(Json(mut body), _): Body<NewCustomer>,
) -> ApiResult {
    if body.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    body.email = normalize_email(&body.email);
    let customer = state.engine.store.create_customer(body).await?;
    info!(customer_id = customer.id, "customer created");
    created(Envelope::data(customer).with_message("Customer created successfully"))
}

pub async fn list_customers(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.store.list_customers().await?))
}

#[derive(Debug, Deserialize)]
pub struct ContactQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// GET /api/customers/search?email=&phone=
pub async fn search_customers(
    State(state): State<GatewayState>,
    WithRejection(Query(query), _): QueryOf<ContactQuery>,
) -> ApiResult {
    let email = query
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(normalize_email);
    let phone = query.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    if email.is_none() && phone.is_none() {
        return Err(invalid("email or phone is required"));
    }
    let customer = state
        .engine
        .store
        .find_customer_by_contact(email.as_deref(), phone)
        .await?;
    let key = email.as_deref().or(phone).unwrap_or_default().to_string();
    ok(Envelope::data(found(customer, "customer", key)?))
}

pub async fn get_customer(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let customer = state.engine.store.get_customer(id).await?;
    ok(Envelope::data(found(customer, "customer", id)?))
}

pub async fn update_customer(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(mut body), _): Body<CustomerUpdate>,
) -> ApiResult {
    body.email = body.email.as_deref().map(normalize_email);
    let customer = state.engine.store.update_customer(id, body).await?;
    ok(Envelope::data(customer).with_message("Customer updated successfully"))
}

pub async fn delete_customer(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    state.engine.store.delete_customer(id).await?;
    ok(Envelope::message(true, "Customer deleted successfully"))
}

// --- services ---

fn check_service_values(duration: Option<i64>, price: Option<f64>) -> Result<(), ApiError> {
    if duration.is_some_and(|d| !(1..=MAX_SERVICE_DURATION_MINUTES).contains(&d)) {
        return Err(invalid(format!(
            "duration must be between 1 and {MAX_SERVICE_DURATION_MINUTES} minutes"
        )));
    }
    if price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(invalid("price must be a non-negative number"));
    }
    Ok(())
}

pub async fn create_service(
    State(state): State<GatewayState>,
    WithRejection(Json(body), _): Body<NewService>,
) -> ApiResult {
    if body.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    check_service_values(Some(body.duration), Some(body.price))?;
    let service = state.engine.store.create_service(body).await?;
    info!(service_id = service.id, name = %service.name, "service created");
    created(Envelope::data(service).with_message("Service created successfully"))
}

pub async fn list_services(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.store.list_services().await?))
}

#[derive(Debug, Deserialize)]
pub struct DurationQuery {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// GET /api/services/duration?min=&max=
pub async fn services_by_duration(
    State(state): State<GatewayState>,
    WithRejection(Query(query), _): QueryOf<DurationQuery>,
) -> ApiResult {
    if let (Some(min), Some(max)) = (query.min, query.max)
        && min > max
    {
        return Err(invalid("min must not exceed max"));
    }
    let services = state
        .engine
        .store
        .list_services_by_duration(query.min, query.max)
        .await?;
    ok(Envelope::list(services))
}

pub async fn get_service(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let service = state.engine.store.get_service(id).await?;
    ok(Envelope::data(found(service, "service", id)?))
}

pub async fn update_service(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(body), _): Body<ServiceUpdate>,
) -> ApiResult {
    check_service_values(body.duration, body.price)?;
    let service = state.engine.store.update_service(id, body).await?;
    ok(Envelope::data(service).with_message("Service updated successfully"))
}

pub async fn delete_service(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    state.engine.store.delete_service(id).await?;
    ok(Envelope::message(true, "Service deleted successfully"))
}

// --- staff ---

pub async fn create_staff(
    State(state): State<GatewayState>,
    WithRejection(Json(body), _): Body<NewStaff>,
) -> ApiResult {
    if body.name.trim().is_empty() {
        return Err(invalid("name is required"));
    }
    let staff = state.engine.store.create_staff(body).await?;
    info!(staff_id = staff.id, name = %staff.name, "staff created");
    created(Envelope::data(staff).with_message("Staff member created successfully"))
}

pub async fn list_staff(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.store.list_staff().await?))
}

pub async fn get_staff(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let staff = state.engine.store.get_staff(id).await?;
    ok(Envelope::data(found(staff, "staff", id)?))
}

pub async fn update_staff(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(body), _): Body<StaffUpdate>,
) -> ApiResult {
    let staff = state.engine.store.update_staff(id, body).await?;
    ok(Envelope::data(staff).with_message("Staff member updated successfully"))
}

pub async fn delete_staff(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    state.engine.store.delete_staff(id).await?;
    ok(Envelope::message(true, "Staff member deleted successfully"))
}

pub async fn add_schedule(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(body), _): Body<NewSchedule>,
) -> ApiResult {
    if body.end_time <= body.start_time {
        return Err(invalid("endTime must be after startTime"));
    }
    found(state.engine.store.get_staff(id).await?, "staff", id)?;
    let schedule = state.engine.store.add_schedule(id, body).await?;
    created(Envelope::data(schedule).with_message("Schedule added successfully"))
}

pub async fn list_schedules(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    found(state.engine.store.get_staff(id).await?, "staff", id)?;
    ok(Envelope::list(state.engine.store.list_schedules(id).await?))
}

/// GET /api/staff/available/{day}
///
/// Schedule rows for a weekday name, matched case-insensitively.
pub async fn schedules_by_day(
    State(state): State<GatewayState>,
    WithRejection(Path(day), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult {
    let day = DayOfWeek::iter()
        .find(|d| d.to_string().eq_ignore_ascii_case(day.trim()))
        .ok_or_else(|| invalid(format!("'{day}' is not a day of the week")))?;
    let schedules = state.engine.availability.list_by_day_of_week(day).await?;
    ok(Envelope::list(schedules))
}

// --- slots ---

pub async fn create_slot(
    State(state): State<GatewayState>,
    WithRejection(Json(body), _): Body<NewSlot>,
) -> ApiResult {
    if body.end_time <= body.start_time {
        return Err(invalid("endTime must be after startTime"));
    }
    found(
        state.engine.store.get_staff(body.staff_id).await?,
        "staff",
        body.staff_id,
    )?;
    let slot = state.engine.store.create_slot(body).await?;
    created(Envelope::data(slot).with_message("Slot created successfully"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub date: Option<NaiveDate>,
    pub staff_id: Option<i64>,
    pub is_booked: Option<bool>,
}

pub async fn list_slots(
    State(state): State<GatewayState>,
    WithRejection(Query(query), _): QueryOf<SlotQuery>,
) -> ApiResult {
    let slots = state
        .engine
        .store
        .list_slots(SlotFilter {
            staff_id: query.staff_id,
            date: query.date,
            is_booked: query.is_booked,
        })
        .await?;
    ok(Envelope::list(slots))
}

/// GET /api/slots/available?date=&staffId=
pub async fn available_slots(
    State(state): State<GatewayState>,
    WithRejection(Query(query), _): QueryOf<SlotQuery>,
) -> ApiResult {
    let slots = state
        .engine
        .availability
        .list_available(query.date, query.staff_id)
        .await?;
    ok(Envelope::list(slots))
}

pub async fn slots_by_staff(
    State(state): State<GatewayState>,
    WithRejection(Path(staff_id), _): IdPath,
) -> ApiResult {
    let slots = state
        .engine
        .store
        .list_slots(SlotFilter {
            staff_id: Some(staff_id),
            ..SlotFilter::default()
        })
        .await?;
    ok(Envelope::list(slots))
}

pub async fn get_slot(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let slot = state.engine.store.get_slot(id).await?;
    ok(Envelope::data(found(slot, "slot", id)?))
}

pub async fn update_slot(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(body), _): Body<SlotUpdate>,
) -> ApiResult {
    if let (Some(start), Some(end)) = (body.start_time, body.end_time)
        && end <= start
    {
        return Err(invalid("endTime must be after startTime"));
    }
    let slot = state.engine.store.update_slot(id, body).await?;
    ok(Envelope::data(slot).with_message("Slot updated successfully"))
}

pub async fn delete_slot(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    state.engine.store.delete_slot(id).await?;
    ok(Envelope::message(true, "Slot deleted successfully"))
}

pub async fn book_slot(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let slot = state.engine.availability.book_slot(id).await?;
    ok(Envelope::data(slot).with_message("Slot booked successfully"))
}

pub async fn free_slot(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let slot = state.engine.availability.free_slot(id).await?;
    ok(Envelope::data(slot).with_message("Slot freed successfully"))
}

// --- appointments ---

/// POST /api/appointments
///
/// Referenced records must exist. A second active booking for the same staff
/// member and instant is rejected with 409.
pub async fn create_appointment(
    State(state): State<GatewayState>,
    WithRejection(Json(body), _): Body<NewAppointment>,
) -> ApiResult {
    if !body.status.is_active() {
        return Err(invalid("new appointments must be PENDING or CONFIRMED"));
    }
    let store = &state.engine.store;
    found(
        store.get_customer(body.customer_id).await?,
        "customer",
        body.customer_id,
    )?;
    found(
        store.get_service(body.service_id).await?,
        "service",
        body.service_id,
    )?;
    found(store.get_staff(body.staff_id).await?, "staff", body.staff_id)?;

    let (staff_id, at) = (body.staff_id, body.appointment_at);
    let Some(appointment) = state.engine.availability.book(body).await? else {
        return Err(BookingError::Conflict {
            staff_id,
            at: display_datetime(at),
        }
        .into());
    };
    info!(appointment_id = appointment.id, staff_id, "appointment created");
    created(Envelope::data(appointment).with_message("Appointment created successfully"))
}

pub async fn list_appointments(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.store.list_appointments().await?))
}

pub async fn get_appointment(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    let appointment = state.engine.store.get_appointment(id).await?;
    ok(Envelope::data(found(appointment, "appointment", id)?))
}

pub async fn update_appointment(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(mut body), _): Body<AppointmentUpdate>,
) -> ApiResult {
    body.appointment_at = body.appointment_at.map(salonbook_core::normalize_timestamp);
    let appointment = state.engine.store.update_appointment(id, body).await?;
    ok(Envelope::data(appointment).with_message("Appointment updated successfully"))
}

pub async fn delete_appointment(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult {
    state.engine.store.delete_appointment(id).await?;
    ok(Envelope::message(true, "Appointment deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Parse one of the four appointment statuses, case-insensitively.
pub fn parse_status(value: &str) -> Result<AppointmentStatus, BookingError> {
    AppointmentStatus::from_str(&value.trim().to_uppercase()).map_err(|_| {
        let allowed: Vec<String> = AppointmentStatus::iter().map(|s| s.to_string()).collect();
        BookingError::Validation(format!(
            "invalid status '{value}'; expected one of {}",
            allowed.join(", ")
        ))
    })
}

/// PATCH /api/appointments/{id}/status
pub async fn update_appointment_status(
    State(state): State<GatewayState>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(body), _): Body<StatusBody>,
) -> ApiResult {
    let status = parse_status(&body.status)?;
    let appointment = state.engine.store.set_appointment_status(id, status).await?;
    info!(appointment_id = id, %status, "appointment status changed");
    ok(Envelope::data(appointment).with_message("Appointment status updated successfully"))
}

pub async fn appointments_by_customer(
    State(state): State<GatewayState>,
    WithRejection(Path(customer_id), _): IdPath,
) -> ApiResult {
    let appointments = state
        .engine
        .store
        .list_appointments_by_customer(customer_id)
        .await?;
    ok(Envelope::list(appointments))
}

pub async fn appointments_by_staff(
    State(state): State<GatewayState>,
    WithRejection(Path(staff_id), _): IdPath,
) -> ApiResult {
    let appointments = state
        .engine
        .store
        .list_appointments_by_staff(staff_id)
        .await?;
    ok(Envelope::list(appointments))
}

// --- call logs ---

pub async fn list_call_logs(State(state): State<GatewayState>) -> ApiResult {
    ok(Envelope::list(state.engine.store.list_call_logs().await?))
}

pub async fn get_call_log(
    State(state): State<GatewayState>,
    WithRejection(Path(call_id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult {
    let log = state.engine.store.get_call_log(&call_id).await?;
    let log = found(log, "call log", &call_id)?;
    ok(Envelope::data(log))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_accepts_any_case() {
        assert_eq!(parse_status("confirmed").unwrap(), AppointmentStatus::Confirmed);
        assert_eq!(parse_status(" CANCELLED ").unwrap(), AppointmentStatus::Cancelled);
    }

    #[test]
    fn unknown_status_lists_allowed_values() {
        let err = parse_status("RESCHEDULED").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("RESCHEDULED"));
        assert!(text.contains("PENDING, CONFIRMED, CANCELLED, COMPLETED"));
    }

    #[test]
    fn service_values_checked() {
        assert!(check_service_values(Some(60), Some(35.0)).is_ok());
        assert!(check_service_values(None, None).is_ok());
        assert!(check_service_values(Some(0), None).is_err());
        assert!(check_service_values(Some(24 * 60), None).is_ok());
        assert!(check_service_values(Some(24 * 60 + 1), None).is_err());
        assert!(check_service_values(Some(1_000_000_000_000), None).is_err());
        assert!(check_service_values(None, Some(-1.0)).is_err());
        assert!(check_service_values(None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
