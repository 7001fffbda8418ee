// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff and recurring weekly schedule operations.

use rusqlite::{OptionalExtension, Row, Transaction, params};
use salonbook_core::{
    BookingError, DayOfWeek, NewSchedule, NewStaff, Staff, StaffSchedule, StaffUpdate,
};

use super::parse_column;
use crate::database::{Database, map_tr_err};

const STAFF_COLUMNS: &str = "id, name, role";
const SCHEDULE_COLUMNS: &str = "id, staff_id, day_of_week, start_time, end_time, is_available";

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
    })
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<StaffSchedule> {
    Ok(StaffSchedule {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        day_of_week: parse_column(row, 2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        is_available: row.get(5)?,
    })
}

fn insert_schedules(
    tx: &Transaction<'_>,
    staff_id: i64,
    schedules: Vec<NewSchedule>,
) -> rusqlite::Result<Vec<StaffSchedule>> {
    let mut stmt = tx.prepare(
        "INSERT INTO staff_schedules (staff_id, day_of_week, start_time, end_time, is_available)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut created = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        stmt.execute(params![
            staff_id,
            schedule.day_of_week.to_string(),
            schedule.start_time,
            schedule.end_time,
            schedule.is_available,
        ])?;
        created.push(StaffSchedule {
            id: tx.last_insert_rowid(),
            staff_id,
            day_of_week: schedule.day_of_week,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            is_available: schedule.is_available,
        });
    }
    Ok(created)
}

pub async fn list_staff(db: &Database) -> Result<Vec<Staff>, BookingError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY id"))?;
            let rows = stmt.query_map([], staff_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_staff(db: &Database, id: i64) -> Result<Option<Staff>, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
                params![id],
                staff_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_staff(db: &Database, staff: NewStaff) -> Result<Staff, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO staff (name, role) VALUES (?1, ?2)",
                params![staff.name, staff.role],
            )?;
            Ok(Staff {
                id: conn.last_insert_rowid(),
                name: staff.name,
                role: staff.role,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a staff member and their schedule rows atomically.
pub async fn create_with_schedules(
    db: &Database,
    staff: NewStaff,
    schedules: Vec<NewSchedule>,
) -> Result<(Staff, Vec<StaffSchedule>), BookingError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO staff (name, role) VALUES (?1, ?2)",
                params![staff.name, staff.role],
            )?;
            let staff_id = tx.last_insert_rowid();
            let created = insert_schedules(&tx, staff_id, schedules)?;
            tx.commit()?;
            Ok((
                Staff {
                    id: staff_id,
                    name: staff.name,
                    role: staff.role,
                },
                created,
            ))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_staff(
    db: &Database,
    id: i64,
    update: StaffUpdate,
) -> Result<Option<Staff>, BookingError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE staff SET
                    name = COALESCE(?2, name),
                    role = COALESCE(?3, role),
                    updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now')
                 WHERE id = ?1",
                params![id, update.name, update.role],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
                params![id],
                staff_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the staff member; schedules and slots cascade.
pub async fn delete_staff(db: &Database, id: i64) -> Result<bool, BookingError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_schedules(
    db: &Database,
    staff_id: i64,
) -> Result<Vec<StaffSchedule>, BookingError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULE_COLUMNS} FROM staff_schedules WHERE staff_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![staff_id], schedule_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn add_schedule(
    db: &Database,
    staff_id: i64,
    schedule: NewSchedule,
) -> Result<StaffSchedule, BookingError> {
    let mut created = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let created = insert_schedules(&tx, staff_id, vec![schedule])?;
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)?;
    created
        .pop()
        .ok_or_else(|| BookingError::Internal("schedule insert returned no row".into()))
}

/// Replace every schedule row of a staff member in one transaction.
pub async fn replace_schedules(
    db: &Database,
    staff_id: i64,
    schedules: Vec<NewSchedule>,
) -> Result<Vec<StaffSchedule>, BookingError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM staff_schedules WHERE staff_id = ?1",
                params![staff_id],
            )?;
            let created = insert_schedules(&tx, staff_id, schedules)?;
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn schedules_for_day(
    db: &Database,
    day: DayOfWeek,
) -> Result<Vec<StaffSchedule>, BookingError> {
    let day = day.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SCHEDULE_COLUMNS} FROM staff_schedules
                 WHERE day_of_week = ?1 ORDER BY staff_id, id"
            ))?;
            let rows = stmt.query_map(params![day], schedule_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Staff with at least one available schedule row on `day`, by id.
pub async fn available_on(db: &Database, day: DayOfWeek) -> Result<Vec<Staff>, BookingError> {
    let day = day.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.name, s.role FROM staff s
                 WHERE EXISTS (
                    SELECT 1 FROM staff_schedules sc
                    WHERE sc.staff_id = s.id AND sc.day_of_week = ?1 AND sc.is_available = 1
                 )
                 ORDER BY s.id",
            )?;
            let rows = stmt.query_map(params![day], staff_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn shift(day: DayOfWeek, available: bool) -> NewSchedule {
        NewSchedule {
            day_of_week: day,
            start_time: hm(9, 0),
            end_time: hm(17, 0),
            is_available: available,
        }
    }

    fn stylist(name: &str) -> NewStaff {
        NewStaff {
            name: name.into(),
            role: "Stylist".into(),
        }
    }

    #[tokio::test]
    async fn staff_with_schedules_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        let (staff, schedules) = create_with_schedules(
            &db,
            stylist("Alex"),
            vec![shift(DayOfWeek::Monday, true), shift(DayOfWeek::Tuesday, false)],
        )
        .await
        .unwrap();
        assert_eq!(schedules.len(), 2);

        let stored = list_schedules(&db, staff.id).await.unwrap();
        assert_eq!(stored, schedules);
        assert_eq!(stored[0].start_time, hm(9, 0));
        assert_eq!(stored[0].day_of_week, DayOfWeek::Monday);
    }

    #[tokio::test]
    async fn available_on_respects_flag_and_day() {
        let db = Database::open_in_memory().await.unwrap();
        let (alex, _) = create_with_schedules(
            &db,
            stylist("Alex"),
            vec![shift(DayOfWeek::Monday, true)],
        )
        .await
        .unwrap();
        create_with_schedules(
            &db,
            stylist("Sam"),
            vec![shift(DayOfWeek::Monday, false), shift(DayOfWeek::Friday, true)],
        )
        .await
        .unwrap();

        let monday = available_on(&db, DayOfWeek::Monday).await.unwrap();
        assert_eq!(monday.iter().map(|s| s.id).collect::<Vec<_>>(), vec![alex.id]);
        assert!(available_on(&db, DayOfWeek::Sunday).await.unwrap().is_empty());
        assert_eq!(
            schedules_for_day(&db, DayOfWeek::Monday).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn replace_schedules_drops_old_rows() {
        let db = Database::open_in_memory().await.unwrap();
        let (staff, _) = create_with_schedules(
            &db,
            stylist("Alex"),
            vec![shift(DayOfWeek::Monday, true), shift(DayOfWeek::Tuesday, true)],
        )
        .await
        .unwrap();

        let replaced = replace_schedules(&db, staff.id, vec![shift(DayOfWeek::Sunday, true)])
            .await
            .unwrap();
        assert_eq!(replaced.len(), 1);
        let stored = list_schedules(&db, staff.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].day_of_week, DayOfWeek::Sunday);
    }

    #[tokio::test]
    async fn deleting_staff_cascades_to_schedules() {
        let db = Database::open_in_memory().await.unwrap();
        let (staff, _) =
            create_with_schedules(&db, stylist("Alex"), vec![shift(DayOfWeek::Monday, true)])
                .await
                .unwrap();
        assert!(delete_staff(&db, staff.id).await.unwrap());
        assert!(list_schedules(&db, staff.id).await.unwrap().is_empty());
        assert!(get_staff(&db, staff.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_schedule_to_unknown_staff_fails() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(
            add_schedule(&db, 42, shift(DayOfWeek::Monday, true))
                .await
                .is_err()
        );
    }
}
