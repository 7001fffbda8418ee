// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `salonbook seed` command implementation.

use salonbook_config::SalonbookConfig;
use salonbook_core::{BookingError, Component};
use salonbook_engine::catalog::{SeedReport, seed_catalog};
use tracing::info;

use crate::serve::open_store;

/// Install the default services, staff, and weekly schedules.
pub async fn run_seed(config: &SalonbookConfig, json: bool) -> Result<SeedReport, BookingError> {
    let storage = open_store(config).await?;
    let report = seed_catalog(storage.as_ref()).await?;
    storage.shutdown().await?;
    info!(?report, "catalog seeded");

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!();
        println!("  salonbook seed");
        println!("  {}", "-".repeat(35));
        println!(
            "    Services:  {} created, {} updated",
            report.services_created, report.services_updated
        );
        println!(
            "    Staff:     {} created, {} updated",
            report.staff_created, report.staff_updated
        );
        println!("    Schedules: {} written", report.schedules_written);
        println!();
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use salonbook_config::StorageConfig;

    #[tokio::test]
    async fn seeding_twice_updates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let config = SalonbookConfig {
            storage: StorageConfig {
                database_path: dir.path().join("seed.db").to_string_lossy().to_string(),
                wal_mode: true,
            },
            ..SalonbookConfig::default()
        };

        let first = run_seed(&config, true).await.unwrap();
        assert_eq!(first.services_created, 6);
        assert_eq!(first.staff_created, 3);
        assert_eq!(first.schedules_written, 21);

        let second = run_seed(&config, true).await.unwrap();
        assert_eq!(second.services_created, 0);
        assert_eq!(second.services_updated, 6);
        assert_eq!(second.staff_updated, 3);
        assert_eq!(second.schedules_written, 21);
    }
}
