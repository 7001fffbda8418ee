// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call log persistence keyed by the external call id.

use rusqlite::{OptionalExtension, Row, params};
use salonbook_core::{BookingError, CallLog, CallLogRecord};

use super::parse_column;
use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, call_id, phone_number, transcript, recording_url, cost, status, \
                       appointment_id, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<CallLog> {
    Ok(CallLog {
        id: row.get(0)?,
        call_id: row.get(1)?,
        phone_number: row.get(2)?,
        transcript: row.get(3)?,
        recording_url: row.get(4)?,
        cost: row.get(5)?,
        status: parse_column(row, 6)?,
        appointment_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub async fn list_call_logs(db: &Database) -> Result<Vec<CallLog>, BookingError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM call_logs ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map([], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_call_log(db: &Database, call_id: &str) -> Result<Option<CallLog>, BookingError> {
    let call_id = call_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM call_logs WHERE call_id = ?1"),
                params![call_id],
                from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Call history for one phone number, newest first.
pub async fn list_by_phone(db: &Database, phone: &str) -> Result<Vec<CallLog>, BookingError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM call_logs WHERE phone_number = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![phone], from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a call log or update the row with the same `call_id`.
///
/// Transcript and status always take the new values. Nullable fields keep
/// their stored value when the record leaves them unset, so a later failure
/// log never detaches an appointment recorded by an earlier delivery.
pub async fn upsert_call_log(db: &Database, record: CallLogRecord) -> Result<CallLog, BookingError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO call_logs
                        (call_id, phone_number, transcript, recording_url, cost, status, appointment_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (call_id) DO UPDATE SET
                        phone_number = COALESCE(excluded.phone_number, call_logs.phone_number),
                        transcript = excluded.transcript,
                        recording_url = COALESCE(excluded.recording_url, call_logs.recording_url),
                        cost = COALESCE(excluded.cost, call_logs.cost),
                        status = excluded.status,
                        appointment_id = COALESCE(excluded.appointment_id, call_logs.appointment_id),
                        updated_at = strftime('%Y-%m-%d %H:%M:%S', 'now')
                     RETURNING {COLUMNS}"
                ),
                params![
                    record.call_id,
                    record.phone_number,
                    record.transcript,
                    record.recording_url,
                    record.cost,
                    record.status.to_string(),
                    record.appointment_id,
                ],
                from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_core::CallStatus;

    fn record(call_id: &str, status: CallStatus) -> CallLogRecord {
        CallLogRecord {
            call_id: call_id.into(),
            phone_number: Some("5551234567".into()),
            transcript: "hello".into(),
            recording_url: None,
            cost: Some(0.12),
            status,
            appointment_id: None,
        }
    }

    #[tokio::test]
    async fn redelivery_updates_in_place() {
        let db = Database::open_in_memory().await.unwrap();
        let first = upsert_call_log(&db, record("call-1", CallStatus::Completed))
            .await
            .unwrap();

        let mut again = record("call-1", CallStatus::Completed);
        again.transcript = "hello again".into();
        again.recording_url = Some("https://rec/1".into());
        let second = upsert_call_log(&db, again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.transcript, "hello again");
        assert_eq!(second.recording_url.as_deref(), Some("https://rec/1"));
        assert_eq!(list_call_logs(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unset_fields_do_not_erase_stored_values() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_call_log(&db, record("call-2", CallStatus::Completed))
            .await
            .unwrap();

        let failed = CallLogRecord {
            call_id: "call-2".into(),
            phone_number: None,
            transcript: "raw".into(),
            recording_url: None,
            cost: None,
            status: CallStatus::Failed,
            appointment_id: None,
        };
        let stored = upsert_call_log(&db, failed).await.unwrap();
        assert_eq!(stored.status, CallStatus::Failed);
        assert_eq!(stored.phone_number.as_deref(), Some("5551234567"));
        assert_eq!(stored.cost, Some(0.12));
    }

    #[tokio::test]
    async fn lookup_by_call_id_and_phone() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_call_log(&db, record("a", CallStatus::Completed))
            .await
            .unwrap();
        upsert_call_log(&db, record("b", CallStatus::CompletedNoBooking))
            .await
            .unwrap();

        let b = get_call_log(&db, "b").await.unwrap().unwrap();
        assert_eq!(b.status, CallStatus::CompletedNoBooking);
        assert!(get_call_log(&db, "zzz").await.unwrap().is_none());
        assert_eq!(list_by_phone(&db, "5551234567").await.unwrap().len(), 2);
        assert!(list_by_phone(&db, "000").await.unwrap().is_empty());
    }
}
