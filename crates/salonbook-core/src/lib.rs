// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the salonbook booking backend.
//!
//! This crate provides the error type, the domain model, and the backend
//! traits (store and voice client) used throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::BookingError;
pub use types::{
    MAX_SERVICE_DURATION_MINUTES, Appointment, AppointmentStatus, AppointmentUpdate, CallHandle, CallLog, CallLogRecord,
    CallStatus, ComponentType, Customer, CustomerContext, CustomerUpdate, DayOfWeek,
    HealthStatus, NewAppointment, NewCustomer, NewSchedule, NewService, NewSlot, NewStaff,
    Service, ServiceUpdate, Slot, SlotUpdate, SlotWithStaff, Staff, StaffSchedule, StaffUpdate,
    normalize_timestamp,
};

pub use traits::{BookingStore, CallClient, Component, SlotFilter};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn appointment_status_accepts_only_four_values() {
        let all: Vec<_> = AppointmentStatus::iter().collect();
        assert_eq!(all.len(), 4);
        for status in all {
            let parsed = AppointmentStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
        assert!(AppointmentStatus::from_str("RESCHEDULED").is_err());
        assert!(AppointmentStatus::from_str("pending").is_err());
    }

    #[test]
    fn appointment_status_wire_format_is_screaming() {
        let json = serde_json::to_string(&AppointmentStatus::Confirmed).unwrap();
        assert_eq!(json, "\"CONFIRMED\"");
        assert_eq!(AppointmentStatus::Pending.to_string(), "PENDING");
    }

    #[test]
    fn only_pending_and_confirmed_are_active() {
        assert!(AppointmentStatus::Pending.is_active());
        assert!(AppointmentStatus::Confirmed.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
        assert!(!AppointmentStatus::Completed.is_active());
    }

    #[test]
    fn call_status_strings() {
        assert_eq!(CallStatus::Completed.to_string(), "completed");
        assert_eq!(
            CallStatus::CompletedNoBooking.to_string(),
            "completed-no-booking"
        );
        assert_eq!(
            CallStatus::CompletedConflict.to_string(),
            "completed-conflict"
        );
        assert_eq!(CallStatus::from_str("failed").unwrap(), CallStatus::Failed);
    }

    #[test]
    fn day_of_week_from_calendar_date() {
        // 2025-03-10 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(DayOfWeek::of(monday), DayOfWeek::Monday);
        assert!(!DayOfWeek::Monday.is_weekend());
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert_eq!(DayOfWeek::of(sunday), DayOfWeek::Sunday);
        assert!(DayOfWeek::Sunday.is_weekend());
        assert_eq!(DayOfWeek::iter().count(), 7);
    }

    #[test]
    fn schedule_covers_half_open_interval() {
        let schedule = StaffSchedule {
            id: 1,
            staff_id: 1,
            day_of_week: DayOfWeek::Monday,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_available: true,
        };
        assert!(schedule.covers(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(schedule.covers(NaiveTime::from_hms_opt(16, 59, 0).unwrap()));
        assert!(!schedule.covers(NaiveTime::from_hms_opt(17, 0, 0).unwrap()));
        assert!(!schedule.covers(NaiveTime::from_hms_opt(8, 30, 0).unwrap()));

        let off = StaffSchedule {
            is_available: false,
            ..schedule
        };
        assert!(!off.covers(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
    }

    #[test]
    fn normalize_drops_subseconds() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_milli_opt(15, 0, 0, 250)
            .unwrap();
        let normalized = normalize_timestamp(at);
        assert_eq!(normalized.to_string(), "2025-03-10 15:00:00");
        assert_eq!(normalize_timestamp(normalized), normalized);
    }

    #[test]
    fn new_appointment_defaults_to_pending() {
        let json = r#"{"customerId":1,"serviceId":2,"staffId":3,"appointmentAt":"2025-03-10T15:00:00"}"#;
        let appt: NewAppointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.staff_id, 3);
    }

    #[test]
    fn error_messages_name_the_resource() {
        let err = BookingError::not_found("staff", 7);
        assert_eq!(err.to_string(), "staff not found: 7");

        let conflict = BookingError::Conflict {
            staff_id: 2,
            at: "2025-03-10 15:00:00".into(),
        };
        assert!(conflict.to_string().contains("staff #2"));

        let wrapped = BookingError::CallProcessing {
            call_id: "call-1".into(),
            source: Box::new(BookingError::storage(std::io::Error::other("disk"))),
        };
        assert!(wrapped.to_string().contains("call-1"));
        assert!(wrapped.to_string().contains("disk"));
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_component<T: Component>() {}
        fn _assert_store<T: BookingStore>() {}
        fn _assert_call_client<T: CallClient>() {}
    }
}
