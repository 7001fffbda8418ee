// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end engine behavior against a file-backed store.

use std::sync::Arc;

use salonbook_config::BookingConfig;
use salonbook_core::{AppointmentStatus, BookingStore, CallStatus};
use salonbook_engine::{BookingEngine, CallDisposition, catalog};
use salonbook_storage::{Database, SqliteStorage};
use serde_json::json;

async fn engine(dir: &tempfile::TempDir) -> BookingEngine {
    let path = dir.path().join("flow.db");
    let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
    let store: Arc<dyn BookingStore> = Arc::new(SqliteStorage::from_database(db));
    catalog::seed_catalog(store.as_ref()).await.unwrap();
    BookingEngine::new(store, BookingConfig::default())
}

#[tokio::test]
async fn concurrent_tool_bookings_yield_one_appointment() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;
    let args = json!({
        "name": "John Smith",
        "date": "2025-03-10T15:00:00",
        "service": "Haircut",
        "staffId": 2
    });

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tools = engine.tools.clone();
        let args = args.clone();
        handles.push(tokio::spawn(async move {
            tools.dispatch("bookAppointment", args).await
        }));
    }
    let mut successes = 0;
    for handle in handles {
        let reply = handle.await.unwrap();
        if reply["success"] == true {
            successes += 1;
        } else {
            assert!(reply["message"].as_str().unwrap().contains("already booked"));
        }
    }

    assert_eq!(successes, 1);
    let appointments = engine.store.list_appointments_by_staff(2).await.unwrap();
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn webhook_then_tool_at_same_instant_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir).await;

    // Monday: the first scheduled staff member (Alex Johnson, id 1) is chosen.
    let outcome = engine
        .orchestrator
        .process_call(&json!({
            "call": {"id": "vapi-123"},
            "transcript": "User: Hi, my name is Priya Patel. My email is Priya@Example.com",
            "functionCall": {"name": "bookAppointment", "parameters": {
                "name": "Priya Patel", "date": "2025-03-10T11:00:00", "service": "facial"
            }}
        }))
        .await
        .unwrap();
    assert_eq!(outcome.disposition, CallDisposition::Booked);
    assert_eq!(outcome.staff.as_ref().unwrap().name, "Alex Johnson");
    assert_eq!(outcome.service.as_ref().unwrap().name, "Facial");
    assert_eq!(outcome.customer.as_ref().unwrap().email, "priya@example.com");

    let reply = engine
        .tools
        .dispatch(
            "bookAppointment",
            json!({"name": "Other", "date": "2025-03-10 11:00", "service": "Haircut", "staffId": 1}),
        )
        .await;
    assert_eq!(reply["success"], false);
    assert!(reply["message"].as_str().unwrap().contains("Staff #1 (Alex Johnson)"));
    assert!(reply["message"].as_str().unwrap().contains("Sarah Miller (#2)"));

    let log = engine.store.get_call_log("vapi-123").await.unwrap().unwrap();
    assert_eq!(log.status, CallStatus::Completed);
}
