// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`BookingStore`] trait.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::OnceCell;
use tracing::debug;

use salonbook_config::model::StorageConfig;
use salonbook_core::{
    Appointment, AppointmentStatus, AppointmentUpdate, BookingError, BookingStore, CallLog,
    CallLogRecord, Component, ComponentType, Customer, CustomerUpdate, DayOfWeek, HealthStatus,
    NewAppointment, NewCustomer, NewSchedule, NewService, NewSlot, NewStaff, Service,
    ServiceUpdate, Slot, SlotFilter, SlotUpdate, SlotWithStaff, Staff, StaffSchedule,
    StaffUpdate, normalize_timestamp,
};

use crate::database::{self, Database};
use crate::queries;
use crate::queries::appointments::UpdateOutcome;

/// SQLite-backed booking store.
///
/// The database is opened lazily by [`SqliteStorage::initialize`]; every
/// store method fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database (used with in-memory databases in tests).
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
                wal_mode: false,
            },
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), BookingError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BookingError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    fn db(&self) -> Result<&Database, BookingError> {
        self.db.get().ok_or_else(|| BookingError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

fn appointment_outcome(
    id: i64,
    at: Option<NaiveDateTime>,
    staff_id: Option<i64>,
    outcome: UpdateOutcome,
) -> Result<Appointment, BookingError> {
    match outcome {
        UpdateOutcome::Updated(appointment) => Ok(appointment),
        UpdateOutcome::Missing => Err(BookingError::not_found("appointment", id)),
        UpdateOutcome::Conflict => Err(BookingError::Conflict {
            staff_id: staff_id.unwrap_or_default(),
            at: at.map(|a| a.to_string()).unwrap_or_default(),
        }),
    }
}

fn deleted(entity: &'static str, id: i64, removed: bool) -> Result<(), BookingError> {
    if removed {
        Ok(())
    } else {
        Err(BookingError::not_found(entity, id))
    }
}

#[async_trait]
impl Component for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BookingError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BookingError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for SqliteStorage {
    // --- customers ---

    async fn list_customers(&self) -> Result<Vec<Customer>, BookingError> {
        queries::customers::list_customers(self.db()?).await
    }

    async fn get_customer(&self, id: i64) -> Result<Option<Customer>, BookingError> {
        queries::customers::get_customer(self.db()?, id).await
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer, BookingError> {
        queries::customers::create_customer(self.db()?, customer).await
    }

    async fn update_customer(
        &self,
        id: i64,
        update: CustomerUpdate,
    ) -> Result<Customer, BookingError> {
        queries::customers::update_customer(self.db()?, id, update)
            .await?
            .ok_or_else(|| BookingError::not_found("customer", id))
    }

    async fn delete_customer(&self, id: i64) -> Result<(), BookingError> {
        let removed = queries::customers::delete_customer(self.db()?, id).await?;
        deleted("customer", id, removed)
    }

    async fn find_customer_by_contact(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<Customer>, BookingError> {
        queries::customers::find_by_contact(self.db()?, email, phone).await
    }

    async fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>, BookingError> {
        queries::customers::find_by_name(self.db()?, name).await
    }

    // --- services ---

    async fn list_services(&self) -> Result<Vec<Service>, BookingError> {
        queries::services::list_services(self.db()?).await
    }

    async fn get_service(&self, id: i64) -> Result<Option<Service>, BookingError> {
        queries::services::get_service(self.db()?, id).await
    }

    async fn find_service_by_name(&self, name: &str) -> Result<Option<Service>, BookingError> {
        queries::services::find_by_name(self.db()?, name).await
    }

    async fn list_services_by_duration(
        &self,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Result<Vec<Service>, BookingError> {
        queries::services::list_by_duration(self.db()?, min, max).await
    }

    async fn create_service(&self, service: NewService) -> Result<Service, BookingError> {
        queries::services::create_service(self.db()?, service).await
    }

    async fn update_service(
        &self,
        id: i64,
        update: ServiceUpdate,
    ) -> Result<Service, BookingError> {
        queries::services::update_service(self.db()?, id, update)
            .await?
            .ok_or_else(|| BookingError::not_found("service", id))
    }

    async fn delete_service(&self, id: i64) -> Result<(), BookingError> {
        let removed = queries::services::delete_service(self.db()?, id).await?;
        deleted("service", id, removed)
    }

    // --- staff and schedules ---

    async fn list_staff(&self) -> Result<Vec<Staff>, BookingError> {
        queries::staff::list_staff(self.db()?).await
    }

    async fn get_staff(&self, id: i64) -> Result<Option<Staff>, BookingError> {
        queries::staff::get_staff(self.db()?, id).await
    }

    async fn create_staff(&self, staff: NewStaff) -> Result<Staff, BookingError> {
        queries::staff::create_staff(self.db()?, staff).await
    }

    async fn create_staff_with_schedules(
        &self,
        staff: NewStaff,
        schedules: Vec<NewSchedule>,
    ) -> Result<(Staff, Vec<StaffSchedule>), BookingError> {
        queries::staff::create_with_schedules(self.db()?, staff, schedules).await
    }

    async fn update_staff(&self, id: i64, update: StaffUpdate) -> Result<Staff, BookingError> {
        queries::staff::update_staff(self.db()?, id, update)
            .await?
            .ok_or_else(|| BookingError::not_found("staff", id))
    }

    async fn delete_staff(&self, id: i64) -> Result<(), BookingError> {
        let removed = queries::staff::delete_staff(self.db()?, id).await?;
        deleted("staff", id, removed)
    }

    async fn list_schedules(&self, staff_id: i64) -> Result<Vec<StaffSchedule>, BookingError> {
        queries::staff::list_schedules(self.db()?, staff_id).await
    }

    async fn add_schedule(
        &self,
        staff_id: i64,
        schedule: NewSchedule,
    ) -> Result<StaffSchedule, BookingError> {
        if self.get_staff(staff_id).await?.is_none() {
            return Err(BookingError::not_found("staff", staff_id));
        }
        queries::staff::add_schedule(self.db()?, staff_id, schedule).await
    }

    async fn replace_schedules(
        &self,
        staff_id: i64,
        schedules: Vec<NewSchedule>,
    ) -> Result<Vec<StaffSchedule>, BookingError> {
        queries::staff::replace_schedules(self.db()?, staff_id, schedules).await
    }

    async fn schedules_for_day(
        &self,
        day: DayOfWeek,
    ) -> Result<Vec<StaffSchedule>, BookingError> {
        queries::staff::schedules_for_day(self.db()?, day).await
    }

    async fn staff_available_on(&self, day: DayOfWeek) -> Result<Vec<Staff>, BookingError> {
        queries::staff::available_on(self.db()?, day).await
    }

    // --- slots ---

    async fn list_slots(&self, filter: SlotFilter) -> Result<Vec<SlotWithStaff>, BookingError> {
        queries::slots::list_slots(self.db()?, filter).await
    }

    async fn get_slot(&self, id: i64) -> Result<Option<SlotWithStaff>, BookingError> {
        queries::slots::get_slot(self.db()?, id).await
    }

    async fn create_slot(&self, slot: NewSlot) -> Result<Slot, BookingError> {
        queries::slots::create_slot(self.db()?, slot).await
    }

    async fn update_slot(&self, id: i64, update: SlotUpdate) -> Result<Slot, BookingError> {
        queries::slots::update_slot(self.db()?, id, update)
            .await?
            .ok_or_else(|| BookingError::not_found("slot", id))
    }

    async fn delete_slot(&self, id: i64) -> Result<(), BookingError> {
        let removed = queries::slots::delete_slot(self.db()?, id).await?;
        deleted("slot", id, removed)
    }

    async fn upsert_slot(&self, slot: NewSlot) -> Result<Slot, BookingError> {
        queries::slots::upsert_slot(self.db()?, slot).await
    }

    // --- appointments ---

    async fn list_appointments(&self) -> Result<Vec<Appointment>, BookingError> {
        queries::appointments::list_appointments(self.db()?).await
    }

    async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, BookingError> {
        queries::appointments::get_appointment(self.db()?, id).await
    }

    async fn list_appointments_by_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<Appointment>, BookingError> {
        queries::appointments::list_by_customer(self.db()?, customer_id).await
    }

    async fn list_appointments_by_staff(
        &self,
        staff_id: i64,
    ) -> Result<Vec<Appointment>, BookingError> {
        queries::appointments::list_by_staff(self.db()?, staff_id).await
    }

    async fn find_active_appointment(
        &self,
        staff_id: i64,
        at: NaiveDateTime,
    ) -> Result<Option<Appointment>, BookingError> {
        queries::appointments::find_active(self.db()?, staff_id, at).await
    }

    async fn create_appointment_checked(
        &self,
        appointment: NewAppointment,
    ) -> Result<Option<Appointment>, BookingError> {
        queries::appointments::create_checked(self.db()?, appointment).await
    }

    async fn update_appointment(
        &self,
        id: i64,
        update: AppointmentUpdate,
    ) -> Result<Appointment, BookingError> {
        let at = update.appointment_at.map(normalize_timestamp);
        let staff_id = update.staff_id;
        let outcome = queries::appointments::update_appointment(self.db()?, id, update).await?;
        appointment_outcome(id, at, staff_id, outcome)
    }

    async fn set_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        let outcome = queries::appointments::set_status(self.db()?, id, status).await?;
        appointment_outcome(id, None, None, outcome)
    }

    async fn delete_appointment(&self, id: i64) -> Result<(), BookingError> {
        let removed = queries::appointments::delete_appointment(self.db()?, id).await?;
        deleted("appointment", id, removed)
    }

    // --- call logs ---

    async fn list_call_logs(&self) -> Result<Vec<CallLog>, BookingError> {
        queries::call_logs::list_call_logs(self.db()?).await
    }

    async fn get_call_log(&self, call_id: &str) -> Result<Option<CallLog>, BookingError> {
        queries::call_logs::get_call_log(self.db()?, call_id).await
    }

    async fn list_call_logs_by_phone(&self, phone: &str) -> Result<Vec<CallLog>, BookingError> {
        queries::call_logs::list_by_phone(self.db()?, phone).await
    }

    async fn upsert_call_log(&self, record: CallLogRecord) -> Result<CallLog, BookingError> {
        queries::call_logs::upsert_call_log(self.db()?, record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn component_identity() {
        let storage = SqliteStorage::new(make_config("unused.db"));
        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.component_type(), ComponentType::Storage);
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let storage = SqliteStorage::new(make_config("never.db"));
        assert!(storage.health_check().await.is_err());
        assert!(matches!(
            storage.list_customers().await,
            Err(BookingError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn missing_rows_map_to_not_found() {
        let storage = SqliteStorage::from_database(Database::open_in_memory().await.unwrap());
        assert!(matches!(
            storage.update_staff(7, StaffUpdate::default()).await,
            Err(BookingError::NotFound { entity: "staff", .. })
        ));
        assert!(matches!(
            storage.delete_slot(7).await,
            Err(BookingError::NotFound { entity: "slot", .. })
        ));
        assert!(matches!(
            storage
                .set_appointment_status(7, AppointmentStatus::Completed)
                .await,
            Err(BookingError::NotFound {
                entity: "appointment",
                ..
            })
        ));
        assert!(matches!(
            storage
                .add_schedule(
                    7,
                    NewSchedule {
                        day_of_week: DayOfWeek::Monday,
                        start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                        end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                        is_available: true,
                    }
                )
                .await,
            Err(BookingError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let storage: std::sync::Arc<dyn BookingStore> = std::sync::Arc::new(
            SqliteStorage::from_database(Database::open_in_memory().await.unwrap()),
        );
        let staff = storage
            .create_staff(NewStaff {
                name: "Mike".into(),
                role: "Nail Technician".into(),
            })
            .await
            .unwrap();
        assert_eq!(storage.list_staff().await.unwrap(), vec![staff]);
    }
}
