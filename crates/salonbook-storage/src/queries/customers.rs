// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer CRUD and identity lookups.

use rusqlite::{OptionalExtension, Row, params};
use salonbook_core::{BookingError, Customer, CustomerUpdate, NewCustomer};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, name, email, phone";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
    })
}

pub async fn list_customers(db: &Database) -> Result<Vec<Customer>, BookingError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM customers ORDER BY id"))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_customer(db: &Database, id: i64) -> Result<Option<Customer>, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn create_customer(
    db: &Database,
    customer: NewCustomer,
) -> Result<Customer, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (name, email, phone) VALUES (?1, ?2, ?3)",
                params![customer.name, customer.email, customer.phone],
            )?;
            Ok(Customer {
                id: conn.last_insert_rowid(),
                name: customer.name,
                email: customer.email,
                phone: customer.phone,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Apply the set fields of `update`. Returns `None` if the row does not exist.
pub async fn update_customer(
    db: &Database,
    id: i64,
    update: CustomerUpdate,
) -> Result<Option<Customer>, BookingError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE customers SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    phone = COALESCE(?4, phone),
                    updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now')
                 WHERE id = ?1",
                params![id, update.name, update.email, update.phone],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM customers WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Returns `false` if no row was deleted.
pub async fn delete_customer(db: &Database, id: i64) -> Result<bool, BookingError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// First customer (lowest id) matching `email` or `phone`.
pub async fn find_by_contact(
    db: &Database,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Option<Customer>, BookingError> {
    if email.is_none() && phone.is_none() {
        return Ok(None);
    }
    let email = email.map(str::to_string);
    let phone = phone.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM customers
                     WHERE (?1 IS NOT NULL AND email = ?1) OR (?2 IS NOT NULL AND phone = ?2)
                     ORDER BY id LIMIT 1"
                ),
                params![email, phone],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// First customer (lowest id) whose name matches, ignoring ASCII case.
pub async fn find_by_name(db: &Database, name: &str) -> Result<Option<Customer>, BookingError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {COLUMNS} FROM customers WHERE name = ?1 COLLATE NOCASE
                     ORDER BY id LIMIT 1"
                ),
                params![name],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
