// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment operations, including the conflict-checked insert.

use chrono::NaiveDateTime;
use rusqlite::{OptionalExtension, Row, params};
use salonbook_core::{
    Appointment, AppointmentStatus, AppointmentUpdate, BookingError, NewAppointment,
    normalize_timestamp,
};

use super::parse_column;
use crate::database::{Database, is_constraint_violation, map_tr_err};

const COLUMNS: &str = "id, customer_id, service_id, staff_id, appointment_at, status";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        service_id: row.get(2)?,
        staff_id: row.get(3)?,
        appointment_at: row.get(4)?,
        status: parse_column(row, 5)?,
    })
}

fn select_one(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Appointment>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM appointments WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

fn select_active(
    conn: &rusqlite::Connection,
    staff_id: i64,
    at: NaiveDateTime,
) -> rusqlite::Result<Option<Appointment>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM appointments
             WHERE staff_id = ?1 AND appointment_at = ?2
               AND status IN ('PENDING', 'CONFIRMED')
             LIMIT 1"
        ),
        params![staff_id, at],
        from_row,
    )
    .optional()
}

async fn list_where(
    db: &Database,
    clause: &'static str,
    id: Option<i64>,
) -> Result<Vec<Appointment>, BookingError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM appointments {clause} ORDER BY appointment_at, id"
            ))?;
            let rows = match id {
                Some(id) => stmt.query_map(params![id], from_row)?,
                None => stmt.query_map([], from_row)?,
            };
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_appointments(db: &Database) -> Result<Vec<Appointment>, BookingError> {
    list_where(db, "", None).await
}

pub async fn list_by_customer(
    db: &Database,
    customer_id: i64,
) -> Result<Vec<Appointment>, BookingError> {
    list_where(db, "WHERE customer_id = ?1", Some(customer_id)).await
}

pub async fn list_by_staff(db: &Database, staff_id: i64) -> Result<Vec<Appointment>, BookingError> {
    list_where(db, "WHERE staff_id = ?1", Some(staff_id)).await
}

pub async fn get_appointment(
    db: &Database,
    id: i64,
) -> Result<Option<Appointment>, BookingError> {
    db.connection()
        .call(move |conn| select_one(conn, id))
        .await
        .map_err(map_tr_err)
}

/// The active (PENDING/CONFIRMED) appointment at exactly `at`, if any.
pub async fn find_active(
    db: &Database,
    staff_id: i64,
    at: NaiveDateTime,
) -> Result<Option<Appointment>, BookingError> {
    let at = normalize_timestamp(at);
    db.connection()
        .call(move |conn| select_active(conn, staff_id, at))
        .await
        .map_err(map_tr_err)
}

/// Insert unless an active appointment holds the same staff and instant.
///
/// The lookup and insert share one IMMEDIATE transaction, and the partial
/// unique index rejects anything that slips past it. Either way the loser
/// gets `Ok(None)`.
pub async fn create_checked(
    db: &Database,
    appointment: NewAppointment,
) -> Result<Option<Appointment>, BookingError> {
    let at = normalize_timestamp(appointment.appointment_at);
    db.connection()
        .call(move |conn| {
            let tx =
                conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            if appointment.status.is_active()
                && select_active(&tx, appointment.staff_id, at)?.is_some()
            {
                return Ok(None);
            }
            let inserted = tx.execute(
                "INSERT INTO appointments (customer_id, service_id, staff_id, appointment_at, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    appointment.customer_id,
                    appointment.service_id,
                    appointment.staff_id,
                    at,
                    appointment.status.to_string(),
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(None),
                Err(e) => return Err(e),
            }
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Some(Appointment {
                id,
                customer_id: appointment.customer_id,
                service_id: appointment.service_id,
                staff_id: appointment.staff_id,
                appointment_at: at,
                status: appointment.status,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Outcome of an update that may collide with another active booking.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Appointment),
    Missing,
    Conflict,
}

pub async fn update_appointment(
    db: &Database,
    id: i64,
    update: AppointmentUpdate,
) -> Result<UpdateOutcome, BookingError> {
    let at = update.appointment_at.map(normalize_timestamp);
    let status = update.status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE appointments SET
                    customer_id = COALESCE(?2, customer_id),
                    service_id = COALESCE(?3, service_id),
                    staff_id = COALESCE(?4, staff_id),
                    appointment_at = COALESCE(?5, appointment_at),
                    status = COALESCE(?6, status),
                    updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now')
                 WHERE id = ?1",
                params![
                    id,
                    update.customer_id,
                    update.service_id,
                    update.staff_id,
                    at,
                    status
                ],
            );
            match changed {
                Ok(0) => return Ok(UpdateOutcome::Missing),
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Ok(UpdateOutcome::Conflict),
                Err(e) => return Err(e),
            }
            Ok(match select_one(conn, id)? {
                Some(appointment) => UpdateOutcome::Updated(appointment),
                None => UpdateOutcome::Missing,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_status(
    db: &Database,
    id: i64,
    status: AppointmentStatus,
) -> Result<UpdateOutcome, BookingError> {
    update_appointment(
        db,
        id,
        AppointmentUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

pub async fn delete_appointment(db: &Database, id: i64) -> Result<bool, BookingError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// UNIQUE violations only; foreign-key and CHECK failures stay errors.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    is_constraint_violation(err)
        && matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
}
