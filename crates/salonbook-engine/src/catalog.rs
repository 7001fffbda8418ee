// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Default service catalog and staff roster.

use chrono::NaiveTime;
use salonbook_core::{
    BookingError, BookingStore, DayOfWeek, NewSchedule, NewService, NewStaff, ServiceUpdate,
    StaffUpdate,
};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::info;

/// (name, description, duration in minutes, price)
pub const DEFAULT_SERVICES: &[(&str, &str, i64, f64)] = &[
    ("Haircut", "Professional haircut and styling", 60, 35.0),
    ("Manicure", "Professional manicure service", 45, 25.0),
    ("Pedicure", "Professional pedicure service", 60, 40.0),
    ("Facial", "Relaxing facial treatment", 90, 80.0),
    ("Massage", "Therapeutic massage", 60, 75.0),
    ("Hair Coloring", "Professional hair coloring service", 120, 120.0),
];

/// (name, role)
pub const DEFAULT_STAFF: &[(&str, &str)] = &[
    ("Alex Johnson", "Senior Stylist"),
    ("Sarah Miller", "Color Specialist"),
    ("Mike Chen", "Nail Technician"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub services_created: usize,
    pub services_updated: usize,
    pub staff_created: usize,
    pub staff_updated: usize,
    pub schedules_written: usize,
}

/// 09:00-17:00 on weekdays, 10:00-16:00 on weekends.
pub fn default_week() -> Vec<NewSchedule> {
    DayOfWeek::iter()
        .filter_map(|day| {
            let (start, end) = if day.is_weekend() { (10, 16) } else { (9, 17) };
            Some(NewSchedule {
                day_of_week: day,
                start_time: NaiveTime::from_hms_opt(start, 0, 0)?,
                end_time: NaiveTime::from_hms_opt(end, 0, 0)?,
                is_available: true,
            })
        })
        .collect()
}

/// Install the default catalog. Safe to run repeatedly: existing services and
/// staff are updated in place and staff schedules are replaced.
pub async fn seed_catalog(store: &dyn BookingStore) -> Result<SeedReport, BookingError> {
    let mut report = SeedReport::default();

    for (name, description, duration, price) in DEFAULT_SERVICES {
        match store.find_service_by_name(name).await? {
            Some(existing) => {
                store
                    .update_service(
                        existing.id,
                        ServiceUpdate {
                            name: None,
                            description: Some(description.to_string()),
                            duration: Some(*duration),
                            price: Some(*price),
                        },
                    )
                    .await?;
                report.services_updated += 1;
            }
            None => {
                store
                    .create_service(NewService {
                        name: name.to_string(),
                        description: description.to_string(),
                        duration: *duration,
                        price: *price,
                    })
                    .await?;
                report.services_created += 1;
            }
        }
    }

    let roster = store.list_staff().await?;
    for (name, role) in DEFAULT_STAFF {
        let staff = match roster.iter().find(|s| s.name == *name) {
            Some(existing) => {
                report.staff_updated += 1;
                store
                    .update_staff(
                        existing.id,
                        StaffUpdate {
                            name: None,
                            role: Some(role.to_string()),
                        },
                    )
                    .await?
            }
            None => {
                report.staff_created += 1;
                store
                    .create_staff(NewStaff {
                        name: name.to_string(),
                        role: role.to_string(),
                    })
                    .await?
            }
        };
        let written = store.replace_schedules(staff.id, default_week()).await?;
        report.schedules_written += written.len();
    }

    info!(
        services_created = report.services_created,
        staff_created = report.staff_created,
        schedules = report.schedules_written,
        "catalog seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_storage::{Database, SqliteStorage};

    #[tokio::test]
    async fn seeding_twice_is_stable() {
        let store = SqliteStorage::from_database(Database::open_in_memory().await.unwrap());

        let first = seed_catalog(&store).await.unwrap();
        assert_eq!(first.services_created, 6);
        assert_eq!(first.staff_created, 3);
        assert_eq!(first.schedules_written, 21);

        let second = seed_catalog(&store).await.unwrap();
        assert_eq!(second.services_created, 0);
        assert_eq!(second.services_updated, 6);
        assert_eq!(second.staff_updated, 3);

        assert_eq!(store.list_services().await.unwrap().len(), 6);
        let staff = store.list_staff().await.unwrap();
        assert_eq!(staff.len(), 3);
        assert_eq!(store.list_schedules(staff[0].id).await.unwrap().len(), 7);
    }

    #[test]
    fn weekend_hours_are_shorter() {
        let week = default_week();
        let saturday = week
            .iter()
            .find(|s| s.day_of_week == DayOfWeek::Saturday)
            .unwrap();
        assert_eq!(saturday.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        let monday = week
            .iter()
            .find(|s| s.day_of_week == DayOfWeek::Monday)
            .unwrap();
        assert_eq!(monday.end_time, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }
}
