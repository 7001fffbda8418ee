// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot projection: concrete reserved intervals per staff member.
//!
//! Rows are unique on (staff_id, date, start_time); [`upsert_slot`] relies on
//! that key so concurrent reservations of the same start converge on one row.

use rusqlite::{OptionalExtension, Row, params};
use salonbook_core::{BookingError, NewSlot, Slot, SlotFilter, SlotUpdate, SlotWithStaff, Staff};

use crate::database::{Database, map_tr_err};

const JOINED_SELECT: &str = "SELECT sl.id, sl.staff_id, sl.date, sl.start_time, sl.end_time,
        sl.is_booked, st.name, st.role
     FROM slots sl JOIN staff st ON st.id = sl.staff_id";

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<Slot> {
    Ok(Slot {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        is_booked: row.get(5)?,
    })
}

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<SlotWithStaff> {
    let slot = slot_from_row(row)?;
    Ok(SlotWithStaff {
        staff: Staff {
            id: slot.staff_id,
            name: row.get(6)?,
            role: row.get(7)?,
        },
        slot,
    })
}

fn select_slot(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Slot>> {
    conn.query_row(
        "SELECT id, staff_id, date, start_time, end_time, is_booked FROM slots WHERE id = ?1",
        params![id],
        slot_from_row,
    )
    .optional()
}

/// Slots matching every set filter field, ordered by date then start time.
pub async fn list_slots(
    db: &Database,
    filter: SlotFilter,
) -> Result<Vec<SlotWithStaff>, BookingError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{JOINED_SELECT}
                 WHERE (?1 IS NULL OR sl.staff_id = ?1)
                   AND (?2 IS NULL OR sl.date = ?2)
                   AND (?3 IS NULL OR sl.is_booked = ?3)
                 ORDER BY sl.date, sl.start_time, sl.staff_id"
            ))?;
            let rows = stmt.query_map(
                params![filter.staff_id, filter.date, filter.is_booked],
                joined_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_slot(db: &Database, id: i64) -> Result<Option<SlotWithStaff>, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{JOINED_SELECT} WHERE sl.id = ?1"),
                params![id],
                joined_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Plain insert; fails on a duplicate (staff, date, start) key.
pub async fn create_slot(db: &Database, slot: NewSlot) -> Result<Slot, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO slots (staff_id, date, start_time, end_time, is_booked)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    slot.staff_id,
                    slot.date,
                    slot.start_time,
                    slot.end_time,
                    slot.is_booked
                ],
            )?;
            Ok(Slot {
                id: conn.last_insert_rowid(),
                staff_id: slot.staff_id,
                date: slot.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
                is_booked: slot.is_booked,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Insert the slot or update the end time and booked flag of the existing
/// row with the same (staff, date, start) key.
pub async fn upsert_slot(db: &Database, slot: NewSlot) -> Result<Slot, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO slots (staff_id, date, start_time, end_time, is_booked)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (staff_id, date, start_time)
                 DO UPDATE SET end_time = excluded.end_time, is_booked = excluded.is_booked
                 RETURNING id, staff_id, date, start_time, end_time, is_booked",
                params![
                    slot.staff_id,
                    slot.date,
                    slot.start_time,
                    slot.end_time,
                    slot.is_booked
                ],
                slot_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_slot(
    db: &Database,
    id: i64,
    update: SlotUpdate,
) -> Result<Option<Slot>, BookingError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE slots SET
                    date = COALESCE(?2, date),
                    start_time = COALESCE(?3, start_time),
                    end_time = COALESCE(?4, end_time),
                    is_booked = COALESCE(?5, is_booked)
                 WHERE id = ?1",
                params![
                    id,
                    update.date,
                    update.start_time,
                    update.end_time,
                    update.is_booked
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_slot(conn, id)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_slot(db: &Database, id: i64) -> Result<bool, BookingError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM slots WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
