// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bookability decisions and the best-effort slot projection.
//!
//! Appointments are the source of truth for conflicts. A conflict is an
//! active (PENDING/CONFIRMED) appointment for the same staff member at the
//! exact same normalized timestamp; overlapping intervals with different
//! start times are not detected. Slots mirror bookings for the listing
//! endpoints and may lag behind appointments.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use salonbook_core::{
    Appointment, BookingError, BookingStore, DayOfWeek, NewAppointment, NewSlot, Slot,
    SlotFilter, SlotUpdate, SlotWithStaff, Staff, StaffSchedule, normalize_timestamp,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Number of alternative start times offered after a conflict.
const MAX_SUGGESTED_TIMES: usize = 3;

/// Other options to offer a caller whose requested time is taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternatives {
    /// Staff whose schedule admits the requested instant and who are free then.
    pub staff: Vec<Staff>,
    /// Later free start times for the requested staff member that day.
    pub times: Vec<NaiveDateTime>,
}

impl Alternatives {
    pub fn is_empty(&self) -> bool {
        self.staff.is_empty() && self.times.is_empty()
    }
}

#[derive(Clone)]
pub struct AvailabilityEngine {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityEngine {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// True iff an active appointment holds `staff_id` at exactly `at`.
    pub async fn check_conflict(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<bool, BookingError> {
        Ok(self.active_at(staff_id, at).await?.is_some())
    }

    /// The active appointment holding `staff_id` at exactly `at`.
    pub async fn active_at(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<Option<Appointment>, BookingError> {
        self.store
            .find_active_appointment(staff_id, normalize_timestamp(at))
            .await
    }

    /// Staff without any schedule rows are unrestricted. Otherwise the row
    /// for the weekday of `at` must be available and contain its time.
    pub async fn is_within_schedule(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<bool, BookingError> {
        let schedules = self.store.list_schedules(staff_id).await?;
        if schedules.is_empty() {
            return Ok(true);
        }
        Ok(day_schedule(&schedules, DayOfWeek::of(at.date()))
            .is_some_and(|s| s.covers(at.time())))
    }

    /// Other staff free at `at`, plus later free hourly starts for `staff_id`.
    pub async fn suggest_alternatives(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<Alternatives, BookingError> {
        let at = normalize_timestamp(at);
        let day = DayOfWeek::of(at.date());

        let mut staff = Vec::new();
        for candidate in self.store.list_staff().await? {
            if candidate.id == staff_id {
                continue;
            }
            if self.is_within_schedule(candidate.id, at).await?
                && !self.check_conflict(candidate.id, at).await?
            {
                staff.push(candidate);
            }
        }

        let schedules = self.store.list_schedules(staff_id).await?;
        let shift_end = if schedules.is_empty() {
            None
        } else {
            match day_schedule(&schedules, day) {
                Some(s) if s.is_available => Some(s.end_time),
                _ => return Ok(Alternatives { staff, times: Vec::new() }),
            }
        };

        let mut times = Vec::new();
        let mut candidate = at + Duration::hours(1);
        while times.len() < MAX_SUGGESTED_TIMES && candidate.date() == at.date() {
            if shift_end.is_some_and(|end| candidate.time() >= end) {
                break;
            }
            if self.is_within_schedule(staff_id, candidate).await?
                && !self.check_conflict(staff_id, candidate).await?
            {
                times.push(candidate);
            }
            candidate += Duration::hours(1);
        }

        Ok(Alternatives { staff, times })
    }

    /// Insert the appointment unless the staff member is already booked at
    /// that instant. The timestamp is normalized first; `Ok(None)` means
    /// conflict.
    pub async fn book(
        &self,
        mut appointment: NewAppointment,
    ) -> Result<Option<Appointment>, BookingError> {
        appointment.appointment_at = normalize_timestamp(appointment.appointment_at);
        self.store.create_appointment_checked(appointment).await
    }

    /// Mark `[start, end)` booked for the staff member.
    ///
    /// Failures are logged and swallowed: the appointment already committed
    /// is the authoritative record.
    pub async fn reserve_slot(
        &self,
        staff_id: i64,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Option<Slot> {
        let start = normalize_timestamp(start);
        let slot = NewSlot {
            staff_id,
            date: start.date(),
            start_time: start.time(),
            end_time: normalize_timestamp(end).time(),
            is_booked: true,
        };
        match self.store.upsert_slot(slot).await {
            Ok(slot) => {
                debug!(staff_id, slot_id = slot.id, "slot reserved");
                Some(slot)
            }
            Err(e) => {
                warn!(staff_id, at = %start, error = %e, "slot projection failed");
                None
            }
        }
    }

    /// Unbooked slots, optionally restricted to a date and staff member.
    pub async fn list_available(
        &self,
        date: Option<NaiveDate>,
        staff_id: Option<i64>,
    ) -> Result<Vec<SlotWithStaff>, BookingError> {
        self.store
            .list_slots(SlotFilter {
                staff_id,
                date,
                is_booked: Some(false),
            })
            .await
    }

    /// Schedule rows for one weekday.
    pub async fn list_by_day_of_week(
        &self,
        day: DayOfWeek,
    ) -> Result<Vec<StaffSchedule>, BookingError> {
        self.store.schedules_for_day(day).await
    }

    pub async fn book_slot(&self, slot_id: i64) -> Result<Slot, BookingError> {
        self.set_booked(slot_id, true).await
    }

    pub async fn free_slot(&self, slot_id: i64) -> Result<Slot, BookingError> {
        self.set_booked(slot_id, false).await
    }

    async fn set_booked(&self, slot_id: i64, is_booked: bool) -> Result<Slot, BookingError> {
        self.store
            .update_slot(
                slot_id,
                SlotUpdate {
                    is_booked: Some(is_booked),
                    ..SlotUpdate::default()
                },
            )
            .await
    }
}

fn day_schedule(schedules: &[StaffSchedule], day: DayOfWeek) -> Option<&StaffSchedule> {
    schedules.iter().find(|s| s.day_of_week == day)
}

/// End of an appointment of `duration_minutes` starting at `start`.
///
/// `None` when the end is not a representable timestamp.
pub fn end_time(start: NaiveDateTime, duration_minutes: i64) -> Option<NaiveDateTime> {
    start.checked_add_signed(Duration::try_minutes(duration_minutes.max(0))?)
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::{AppointmentStatus, NewCustomer, NewSchedule, NewService, NewStaff};
    use salonbook_storage::{Database, SqliteStorage};
    use tracing_test::traced_test;

    struct Fixture {
        engine: AvailabilityEngine,
        store: Arc<dyn BookingStore>,
        customer_id: i64,
        service_id: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let store: Arc<dyn BookingStore> = Arc::new(SqliteStorage::from_database(db));
        let customer = store
            .create_customer(NewCustomer {
                name: "John Smith".into(),
                email: "john@example.com".into(),
                phone: "5551234567".into(),
            })
            .await
            .unwrap();
        let service = store
            .create_service(NewService {
                name: "Haircut".into(),
                description: "Cut".into(),
                duration: 60,
                price: 35.0,
            })
            .await
            .unwrap();
        Fixture {
            engine: AvailabilityEngine::new(store.clone()),
            store,
            customer_id: customer.id,
            service_id: service.id,
        }
    }

    async fn staff_with_shift(store: &Arc<dyn BookingStore>, name: &str, day: DayOfWeek) -> Staff {
        let (staff, _) = store
            .create_staff_with_schedules(
                NewStaff {
                    name: name.into(),
                    role: "Stylist".into(),
                },
                vec![NewSchedule {
                    day_of_week: day,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                    is_available: true,
                }],
            )
            .await
            .unwrap();
        staff
    }

    fn monday(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn request(f: &Fixture, staff_id: i64, at: NaiveDateTime) -> NewAppointment {
        NewAppointment {
            customer_id: f.customer_id,
            service_id: f.service_id,
            staff_id,
            appointment_at: at,
            status: AppointmentStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn second_booking_at_same_instant_conflicts() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;

        assert!(!f.engine.check_conflict(staff.id, monday(15, 0)).await.unwrap());
        let first = f.engine.book(request(&f, staff.id, monday(15, 0))).await.unwrap();
        assert!(first.is_some());
        assert!(f.engine.check_conflict(staff.id, monday(15, 0)).await.unwrap());

        let with_nanos = monday(15, 0) + Duration::nanoseconds(250);
        let second = f.engine.book(request(&f, staff.id, with_nanos)).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn overlapping_but_distinct_start_is_not_a_conflict() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        f.engine.book(request(&f, staff.id, monday(15, 0))).await.unwrap();
        assert!(!f.engine.check_conflict(staff.id, monday(15, 30)).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_appointment_frees_the_instant() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        let booked = f
            .engine
            .book(request(&f, staff.id, monday(11, 0)))
            .await
            .unwrap()
            .unwrap();
        f.store
            .set_appointment_status(booked.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert!(!f.engine.check_conflict(staff.id, monday(11, 0)).await.unwrap());
    }

    #[tokio::test]
    async fn schedule_bounds() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        assert!(f.engine.is_within_schedule(staff.id, monday(9, 0)).await.unwrap());
        assert!(!f.engine.is_within_schedule(staff.id, monday(17, 0)).await.unwrap());
        let tuesday = monday(10, 0) + Duration::days(1);
        assert!(!f.engine.is_within_schedule(staff.id, tuesday).await.unwrap());

        let free = f
            .store
            .create_staff(NewStaff {
                name: "Free".into(),
                role: "Stylist".into(),
            })
            .await
            .unwrap();
        assert!(f.engine.is_within_schedule(free.id, tuesday).await.unwrap());
    }

    #[tokio::test]
    async fn alternatives_offer_other_staff_and_later_times() {
        let f = fixture().await;
        let alex = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        let sarah = staff_with_shift(&f.store, "Sarah", DayOfWeek::Monday).await;
        staff_with_shift(&f.store, "Sunday Only", DayOfWeek::Sunday).await;

        f.engine.book(request(&f, alex.id, monday(14, 0))).await.unwrap();
        f.engine.book(request(&f, alex.id, monday(15, 0))).await.unwrap();

        let alt = f.engine.suggest_alternatives(alex.id, monday(14, 0)).await.unwrap();
        assert_eq!(alt.staff.iter().map(|s| s.id).collect::<Vec<_>>(), vec![sarah.id]);
        assert_eq!(alt.times, vec![monday(16, 0)]);
        assert!(!alt.is_empty());
    }

    #[tokio::test]
    async fn reserve_slot_upserts_on_start() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        let first = f
            .engine
            .reserve_slot(staff.id, monday(10, 0), monday(10, 45))
            .await
            .unwrap();
        let second = f
            .engine
            .reserve_slot(staff.id, monday(10, 0), monday(11, 0))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.end_time, NaiveTime::from_hms_opt(11, 0, 0).unwrap());
        assert!(second.is_booked);
    }

    #[tokio::test]
    #[traced_test]
    async fn reserve_slot_failure_is_logged_not_raised() {
        let f = fixture().await;
        let slot = f.engine.reserve_slot(9999, monday(10, 0), monday(11, 0)).await;
        assert!(slot.is_none());
        assert!(logs_contain("slot projection failed"));
    }

    #[tokio::test]
    async fn book_and_free_slot() {
        let f = fixture().await;
        let staff = staff_with_shift(&f.store, "Alex", DayOfWeek::Monday).await;
        let slot = f
            .store
            .create_slot(NewSlot {
                staff_id: staff.id,
                date: monday(9, 0).date(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                is_booked: false,
            })
            .await
            .unwrap();

        assert_eq!(f.engine.list_available(Some(slot.date), None).await.unwrap().len(), 1);
        assert!(f.engine.book_slot(slot.id).await.unwrap().is_booked);
        assert!(f.engine.list_available(None, Some(staff.id)).await.unwrap().is_empty());
        assert!(!f.engine.free_slot(slot.id).await.unwrap().is_booked);
        assert!(matches!(
            f.engine.book_slot(424242).await,
            Err(BookingError::NotFound { .. })
        ));
    }

    #[test]
    fn end_time_out_of_range_is_none() {
        assert_eq!(end_time(monday(10, 0), 1_000_000_000_000), None);
        assert_eq!(end_time(monday(10, 0), i64::MAX), None);
    }

    #[test]
    fn end_time_adds_duration() {
        assert_eq!(end_time(monday(10, 0), 45), Some(monday(10, 45)));
        assert_eq!(end_time(monday(10, 0), -30), Some(monday(10, 0)));
        assert_eq!(parse_time_of_day("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time_of_day("9am"), None);
    }
}
