// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store trait for the booking data model.
//!
//! Implementations must enforce two invariants at the storage level:
//! at most one active (PENDING/CONFIRMED) appointment per staff and exact
//! timestamp, and at most one call log per external call id.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::BookingError;
use crate::traits::adapter::Component;
use crate::types::{
    Appointment, AppointmentStatus, AppointmentUpdate, CallLog, CallLogRecord, Customer,
    CustomerUpdate, DayOfWeek, NewAppointment, NewCustomer, NewSchedule, NewService, NewSlot,
    NewStaff, Service, ServiceUpdate, Slot, SlotUpdate, SlotWithStaff, Staff, StaffSchedule,
    StaffUpdate,
};

/// Filter for slot listings. Unset fields do not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    pub staff_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub is_booked: Option<bool>,
}

/// Persistence backend for customers, catalog, staff, slots, appointments,
/// and call logs.
///
/// `get_*` methods return `Ok(None)` for a missing row; `update_*` and
/// `delete_*` return [`BookingError::NotFound`].
#[async_trait]
pub trait BookingStore: Component {
    // --- customers ---

    async fn list_customers(&self) -> Result<Vec<Customer>, BookingError>;

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, BookingError>;

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, BookingError>;

    async fn update_customer(
        &self,
        id: i64,
        update: CustomerUpdate,
    ) -> Result<Customer, BookingError>;

    async fn delete_customer(&self, id: i64) -> Result<(), BookingError>;

    /// First customer whose email equals `email` or whose phone equals `phone`.
    ///
    /// A `None` argument does not participate in the match.
    async fn find_customer_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Customer>, BookingError>;

    /// First customer (lowest id) whose name matches case-insensitively.
    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, BookingError>;

    // --- services ---

    async fn list_services(&self) -> Result<Vec<Service>, BookingError>;

    async fn get_service(&self, id: i64) -> Result<Option<Service>, BookingError>;

    /// Case-sensitive exact name match.
    async fn find_service_by_name(&self, name: &str) -> Result<Option<Service>, BookingError>;

    async fn list_services_by_duration(
        &self,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<Vec<Service>, BookingError>;

    async fn create_service(&self, service: NewService) -> Result<Service, BookingError>;

    async fn update_service(&self, id: i64, update: ServiceUpdate)
    -> Result<Service, BookingError>;

    async fn delete_service(&self, id: i64) -> Result<(), BookingError>;

    // --- staff and schedules ---

    async fn list_staff(&self) -> Result<Vec<Staff>, BookingError>;

    async fn get_staff(&self, id: i64) -> Result<Option<Staff>, BookingError>;

    async fn create_staff(&self, staff: NewStaff) -> Result<Staff, BookingError>;

    /// Creates a staff member and all schedule rows in one transaction.
    async fn create_staff_with_schedules(
        &self,
        staff: NewStaff,
        schedules: Vec<NewSchedule>,
    ) -> Result<(Staff, Vec<StaffSchedule>), BookingError>;

    async fn update_staff(&self, id: i64, update: StaffUpdate) -> Result<Staff, BookingError>;

    async fn delete_staff(&self, id: i64) -> Result<(), BookingError>;

    async fn list_schedules(&self, staff_id: i64) -> Result<Vec<StaffSchedule>, BookingError>;

    async fn add_schedule(
        &self,
        staff_id: i64,
        schedule: NewSchedule,
    ) -> Result<StaffSchedule, BookingError>;

    /// Deletes every schedule row for the staff member, then inserts `schedules`.
    async fn replace_schedules(
        &self,
        staff_id: i64,
        schedules: Vec<NewSchedule>,
    ) -> Result<Vec<StaffSchedule>, BookingError>;

    /// All schedule rows for one weekday, ordered by staff id.
    async fn schedules_for_day(&self, day: DayOfWeek)
    -> Result<Vec<StaffSchedule>, BookingError>;

    /// Staff with an available schedule row on `day`, ordered by staff id.
    async fn staff_available_on(&self, day: DayOfWeek) -> Result<Vec<Staff>, BookingError>;

    // --- slots ---

    async fn list_slots(&self, filter: SlotFilter) -> Result<Vec<SlotWithStaff>, BookingError>;

    async fn get_slot(&self, id: i64) -> Result<Option<SlotWithStaff>, BookingError>;

    async fn create_slot(&self, slot: NewSlot) -> Result<Slot, BookingError>;

    async fn update_slot(&self, id: i64, update: SlotUpdate) -> Result<Slot, BookingError>;

    async fn delete_slot(&self, id: i64) -> Result<(), BookingError>;

    /// Inserts or updates the slot on its (staff, date, start time) key.
    async fn upsert_slot(&self, slot: NewSlot) -> Result<Slot, BookingError>;

    // --- appointments ---

    async fn list_appointments(&self) -> Result<Vec<Appointment>, BookingError>;

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, BookingError>;

    async fn list_appointments_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Appointment>, BookingError>;

    async fn list_appointments_by_staff(
        &self,
        staff_id: i64,
    ) -> Result<Vec<Appointment>, BookingError>;

    /// Active appointment for the staff member at exactly `at`, if any.
    async fn find_active_appointment(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<Option<Appointment>, BookingError>;

    /// Inserts the appointment unless an active one already holds the same
    /// staff and timestamp. Returns `Ok(None)` on conflict.
    ///
    /// The check and the insert run in one transaction.
    async fn create_appointment_checked(
        &self,
        appointment: NewAppointment,
    ) -> Result<Option<Appointment>, BookingError>;

    async fn update_appointment(
        &self,
        id: i64,
        update: AppointmentUpdate,
    ) -> Result<Appointment, BookingError>;

    async fn set_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, BookingError>;

    async fn delete_appointment(&self, id: i64) -> Result<(), BookingError>;

    // --- call logs ---

    async fn list_call_logs(&self) -> Result<Vec<CallLog>, BookingError>;

    async fn get_call_log(&self, call_id: &str) -> Result<Option<CallLog>, BookingError>;

    async fn list_call_logs_by_phone(&self, phone: &str) -> Result<Vec<CallLog>, BookingError>;

    /// Inserts the call log or updates the row with the same call id.
    async fn upsert_call_log(&self, record: CallLogRecord) -> Result<CallLog, BookingError>;
}
