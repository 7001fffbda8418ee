// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Find-or-create resolution of customers, services, and staff.
//!
//! Resolution never fails for missing data: absent fields degrade to the
//! configured sentinels, unknown services are auto-created, and a default
//! staff member is synthesized when the salon has none.

use std::sync::Arc;

use chrono::NaiveDateTime;
use salonbook_config::BookingConfig;
use salonbook_core::{
    BookingError, BookingStore, Customer, CustomerUpdate, DayOfWeek, NewCustomer, NewSchedule,
    NewService, NewStaff, Service, Staff,
};
use strum::IntoEnumIterator;
use tracing::{debug, info};

/// Resolves partial input to canonical store records.
#[derive(Clone)]
pub struct EntityResolver {
    store: Arc<dyn BookingStore>,
    config: Arc<BookingConfig>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<BookingConfig>) -> Self {
        Self { store, config }
    }

    /// Find the customer by email or phone and overwrite their details, or
    /// create a new one.
    ///
    /// Email is lower-cased before lookup and storage. Sentinel contact
    /// values never take part in the match; with no real contact the lookup
    /// falls back to the name.
    pub async fn resolve_customer(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Customer, BookingError> {
        let name = non_blank(name).unwrap_or(&self.config.unknown_customer_name);
        let email = non_blank(email)
            .map(str::to_lowercase)
            .unwrap_or_else(|| self.config.unknown_email.clone());
        let phone = non_blank(phone).unwrap_or(&self.config.unknown_phone);

        let match_email = (!self.config.is_unknown_email(&email)).then_some(email.as_str());
        let match_phone = (!self.config.is_unknown_phone(phone)).then_some(phone);

        let existing = if match_email.is_some() || match_phone.is_some() {
            self.store
                .find_customer_by_contact(match_email, match_phone)
                .await?
        } else if !self.config.is_unknown_name(name) {
            self.store.find_customer_by_name(name).await?
        } else {
            None
        };

        match existing {
            Some(customer) => {
                let update = CustomerUpdate {
                    name: Some(name.to_string()),
                    email: Some(email),
                    phone: match_phone.map(str::to_string),
                };
                debug!(customer_id = customer.id, "updating resolved customer");
                self.store.update_customer(customer.id, update).await
            }
            None => {
                let customer = self
                    .store
                    .create_customer(NewCustomer {
                        name: name.to_string(),
                        email,
                        phone: phone.to_string(),
                    })
                    .await?;
                info!(customer_id = customer.id, "created customer");
                Ok(customer)
            }
        }
    }

    /// Name-only resolution used by the in-call booking tool.
    pub async fn resolve_customer_by_name(&self, name: &str) -> Result<Customer, BookingError> {
        let name = non_blank(Some(name)).unwrap_or(&self.config.unknown_customer_name);
        if let Some(customer) = self.store.find_customer_by_name(name).await? {
            return Ok(customer);
        }
        let customer = self
            .store
            .create_customer(NewCustomer {
                name: name.to_string(),
                email: self.config.unknown_email.clone(),
                phone: self.config.unknown_phone.clone(),
            })
            .await?;
        info!(customer_id = customer.id, "created customer from name");
        Ok(customer)
    }

    /// Exact match, then case-insensitive substring match. Never creates.
    ///
    /// Substring candidates are taken in catalog id order.
    pub async fn find_service(&self, name: &str) -> Result<Option<Service>, BookingError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        if let Some(service) = self.store.find_service_by_name(name).await? {
            return Ok(Some(service));
        }
        let needle = name.to_lowercase();
        let catalog = self.store.list_services().await?;
        Ok(catalog
            .into_iter()
            .find(|s| s.name.to_lowercase().contains(&needle)))
    }

    /// Like [`find_service`](Self::find_service), but creates a placeholder
    /// service when nothing matches.
    pub async fn resolve_service(&self, name: Option<&str>) -> Result<Service, BookingError> {
        let name = non_blank(name).unwrap_or(&self.config.default_service);
        if let Some(service) = self.find_service(name).await? {
            return Ok(service);
        }
        let service = self
            .store
            .create_service(NewService {
                name: name.to_string(),
                description: format!("Auto-created service for {name}"),
                duration: self.config.auto_service_duration_minutes,
                price: self.config.auto_service_price,
            })
            .await?;
        info!(service_id = service.id, name = %service.name, "auto-created service");
        Ok(service)
    }

    /// First staff member scheduled on the weekday of `at`.
    ///
    /// Falls back to the first staff member by id, and synthesizes a default
    /// staff member with a seven-day shift when there is no staff at all.
    /// Whether the staff member is free at `at` is not checked here.
    pub async fn resolve_staff(&self, at: NaiveDateTime) -> Result<Staff, BookingError> {
        let day = DayOfWeek::of(at.date());
        if let Some(staff) = self.store.staff_available_on(day).await?.into_iter().next() {
            return Ok(staff);
        }
        if let Some(staff) = self.store.list_staff().await?.into_iter().next() {
            debug!(staff_id = staff.id, %day, "no staff scheduled, using first staff member");
            return Ok(staff);
        }

        let (start_time, end_time) = self.config.default_shift().ok_or_else(|| {
            BookingError::Config(format!(
                "invalid default shift {}-{}",
                self.config.default_shift_start, self.config.default_shift_end
            ))
        })?;
        let schedules = DayOfWeek::iter()
            .map(|day_of_week| NewSchedule {
                day_of_week,
                start_time,
                end_time,
                is_available: true,
            })
            .collect();
        let (staff, _) = self
            .store
            .create_staff_with_schedules(
                NewStaff {
                    name: self.config.default_staff_name.clone(),
                    role: self.config.default_staff_role.clone(),
                },
                schedules,
            )
            .await?;
        info!(staff_id = staff.id, "created default staff member");
        Ok(staff)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use salonbook_storage::{Database, SqliteStorage};

    async fn resolver() -> (EntityResolver, Arc<dyn BookingStore>) {
        let db = Database::open_in_memory().await.unwrap();
        let store: Arc<dyn BookingStore> = Arc::new(SqliteStorage::from_database(db));
        (
            EntityResolver::new(store.clone(), Arc::new(BookingConfig::default())),
            store,
        )
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn email_case_resolves_to_same_customer() {
        let (resolver, store) = resolver().await;
        let first = resolver
            .resolve_customer(Some("Jane Doe"), Some("Jane@Example.COM"), None)
            .await
            .unwrap();
        let second = resolver
            .resolve_customer(Some("Jane D."), Some("jane@example.com"), None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "jane@example.com");
        assert_eq!(second.name, "Jane D.");
        assert_eq!(store.list_customers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn phone_match_overwrites_email() {
        let (resolver, _) = resolver().await;
        let first = resolver
            .resolve_customer(Some("Sam"), None, Some("5551112222"))
            .await
            .unwrap();
        assert_eq!(first.email, "unknown@example.com");

        let second = resolver
            .resolve_customer(Some("Sam"), Some("sam@x.io"), Some("5551112222"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "sam@x.io");
    }

    #[tokio::test]
    async fn sentinel_phone_does_not_replace_stored_phone() {
        let (resolver, _) = resolver().await;
        resolver
            .resolve_customer(Some("Ann"), Some("ann@x.io"), Some("5550001111"))
            .await
            .unwrap();
        let again = resolver
            .resolve_customer(Some("Ann"), Some("ann@x.io"), Some("0000000000"))
            .await
            .unwrap();
        assert_eq!(again.phone, "5550001111");
    }

    #[tokio::test]
    async fn anonymous_callers_do_not_collapse() {
        let (resolver, store) = resolver().await;
        resolver
            .resolve_customer(Some("Alice"), None, None)
            .await
            .unwrap();
        resolver
            .resolve_customer(Some("Bob"), None, None)
            .await
            .unwrap();
        let repeat = resolver
            .resolve_customer(Some("alice"), None, None)
            .await
            .unwrap();

        assert_eq!(store.list_customers().await.unwrap().len(), 2);
        assert_eq!(repeat.name, "alice");
    }

    #[tokio::test]
    async fn missing_everything_degrades_to_sentinels() {
        let (resolver, _) = resolver().await;
        let customer = resolver.resolve_customer(None, Some("  "), None).await.unwrap();
        assert_eq!(customer.name, "Unknown Customer");
        assert_eq!(customer.email, "unknown@example.com");
        assert_eq!(customer.phone, "0000000000");
    }

    #[tokio::test]
    async fn service_lookup_ignores_case() {
        let (resolver, store) = resolver().await;
        let manicure = store
            .create_service(NewService {
                name: "Manicure".into(),
                description: "Nails".into(),
                duration: 45,
                price: 25.0,
            })
            .await
            .unwrap();

        let upper = resolver.resolve_service(Some("MANICURE")).await.unwrap();
        let lower = resolver.resolve_service(Some("manicure")).await.unwrap();
        assert_eq!(upper.id, manicure.id);
        assert_eq!(lower.id, manicure.id);
        assert_eq!(store.list_services().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_service_is_created_once() {
        let (resolver, store) = resolver().await;
        let created = resolver.resolve_service(Some("Beard Trim")).await.unwrap();
        assert_eq!(created.duration, 60);
        assert_eq!(created.price, 50.0);
        assert_eq!(created.description, "Auto-created service for Beard Trim");

        let again = resolver.resolve_service(Some("beard trim")).await.unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(store.list_services().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_service_does_not_create() {
        let (resolver, store) = resolver().await;
        assert!(resolver.find_service("Nothing").await.unwrap().is_none());
        assert!(store.list_services().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_staff_synthesized_with_full_week() {
        let (resolver, store) = resolver().await;
        let staff = resolver.resolve_staff(at(2025, 3, 10, 15)).await.unwrap();
        assert_eq!(staff.name, "Default Stylist");
        assert_eq!(staff.role, "Senior Stylist");

        let schedules = store.list_schedules(staff.id).await.unwrap();
        assert_eq!(schedules.len(), 7);
        assert!(schedules.iter().all(|s| s.is_available));

        let again = resolver.resolve_staff(at(2025, 3, 11, 10)).await.unwrap();
        assert_eq!(again.id, staff.id);
        assert_eq!(store.list_staff().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn staff_scheduled_on_weekday_preferred() {
        let (resolver, store) = resolver().await;
        let weekend_only = store
            .create_staff(NewStaff {
                name: "Weekend".into(),
                role: "Stylist".into(),
            })
            .await
            .unwrap();
        let shift = |day| NewSchedule {
            day_of_week: day,
            start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_available: true,
        };
        store
            .add_schedule(weekend_only.id, shift(DayOfWeek::Saturday))
            .await
            .unwrap();
        let weekday = store
            .create_staff(NewStaff {
                name: "Weekday".into(),
                role: "Stylist".into(),
            })
            .await
            .unwrap();
        store
            .add_schedule(weekday.id, shift(DayOfWeek::Monday))
            .await
            .unwrap();

        // 2025-03-10 is a Monday, 2025-03-12 a Wednesday.
        let monday = resolver.resolve_staff(at(2025, 3, 10, 15)).await.unwrap();
        assert_eq!(monday.id, weekday.id);
        let wednesday = resolver.resolve_staff(at(2025, 3, 12, 15)).await.unwrap();
        assert_eq!(wednesday.id, weekend_only.id);
    }
}
