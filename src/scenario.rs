//! Scripted end-to-end run (`dbmanager test`).
//!
//! Exercises every table operation in order against whichever backend is
//! active, round-tripping the data through CSV on the way.

use std::path::Path;

use crate::services::database::traits::{NewRecord, Record};
use crate::services::{CsvBridge, ImportOutcome, RecordStore, StoreResult};

/// Table contents at the two checkpoints of the run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub after_insert: Vec<Record>,
    pub final_rows: Vec<Record>,
    pub imported: ImportOutcome,
}

pub async fn run_scripted_sequence(
    store: &RecordStore,
    bridge: &CsvBridge,
    csv_path: &Path,
) -> StoreResult<ScenarioReport> {
    let mode = store.manager().mode().await;
    tracing::info!("Starting scripted run ({} mode)", mode);

    if let Err(e) = store.drop_table().await {
        tracing::debug!("Initial drop failed, continuing: {}", e);
    }
    store.create_table().await?;

    store.insert_row("Alice", 10).await?;
    let users: Vec<NewRecord> = (1..=5)
        .map(|i| NewRecord::new(format!("User{}", i), i))
        .collect();
    store.bulk_insert(&users).await?;

    let after_insert = store.select_all(None).await?;
    tracing::info!("Rows after insert:");
    log_rows(&after_insert);

    store.update_row("User3", 333).await?;
    store.delete_row("User1").await?;
    bridge.export(csv_path).await?;

    store.drop_table().await?;
    store.create_table().await?;
    let imported = bridge.import(csv_path).await?;

    let final_rows = store.select_all(None).await?;
    tracing::info!("Final rows:");
    log_rows(&final_rows);
    tracing::info!("Scripted run finished successfully");

    Ok(ScenarioReport {
        after_insert,
        final_rows,
        imported,
    })
}

fn log_rows(rows: &[Record]) {
    for row in rows {
        tracing::info!("  {}", row);
    }
}
