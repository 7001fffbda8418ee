// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service catalog operations.

use rusqlite::{OptionalExtension, Row, params};
use salonbook_core::{BookingError, NewService, Service, ServiceUpdate};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, name, description, duration, price";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration: row.get(3)?,
        price: row.get(4)?,
    })
}

/// All services in insertion order.
pub async fn list_services(db: &Database) -> Result<Vec<Service>, BookingError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM services ORDER BY id"))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_service(db: &Database, id: i64) -> Result<Option<Service>, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM services WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Case-sensitive exact name match (lowest id wins).
pub async fn find_by_name(db: &Database, name: &str) -> Result<Option<Service>, BookingError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM services WHERE name = ?1 ORDER BY id LIMIT 1"),
                params![name],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Services whose duration lies within the inclusive bounds.
pub async fn list_by_duration(
    db: &Database,
    min: Option<i64>,
    max: Option<i64>,
) -> Result<Vec<Service>, BookingError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM services
                 WHERE (?1 IS NULL OR duration >= ?1) AND (?2 IS NULL OR duration <= ?2)
                 ORDER BY duration, id"
            ))?;
            let rows = stmt.query_map(params![min, max], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_service(db: &Database, service: NewService) -> Result<Service, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO services (name, description, duration, price) VALUES (?1, ?2, ?3, ?4)",
                params![
                    service.name,
                    service.description,
                    service.duration,
                    service.price
                ],
            )?;
            Ok(Service {
                id: conn.last_insert_rowid(),
                name: service.name,
                description: service.description,
                duration: service.duration,
                price: service.price,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Apply the set fields of `update`. Returns `None` if the row does not exist.
pub async fn update_service(
    db: &Database,
    id: i64,
    update: ServiceUpdate,
) -> Result<Option<Service>, BookingError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE services SET
                    name = COALESCE(?2, name),
                    description = COALESCE(?3, description),
                    duration = COALESCE(?4, duration),
                    price = COALESCE(?5, price),
                    updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now')
                 WHERE id = ?1",
                params![
                    id,
                    update.name,
                    update.description,
                    update.duration,
                    update.price
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM services WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_service(db: &Database, id: i64) -> Result<bool, BookingError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}
