//! CRUD and bulk operations against the managed table.
//!
//! Every call takes one snapshot of the manager's context and runs entirely
//! against it. Inputs are validated before any transaction is opened.

use super::error::StoreResult;
use super::manager::ConnectionManager;
use super::traits::{NewRecord, Record};

#[derive(Debug, Clone)]
pub struct RecordStore {
    manager: ConnectionManager,
}

impl RecordStore {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    fn table(&self) -> &str {
        self.manager.schema().table_name()
    }

    /// Create the table; a no-op when it already exists.
    pub async fn create_table(&self) -> StoreResult<()> {
        let context = self.manager.current().await;
        context.connection()?.create_table().await?;
        tracing::info!("Table {} created", self.table());
        Ok(())
    }

    /// Drop the table; a no-op when it is missing.
    pub async fn drop_table(&self) -> StoreResult<()> {
        let context = self.manager.current().await;
        context.connection()?.drop_table().await?;
        tracing::info!("Table {} dropped", self.table());
        Ok(())
    }

    /// Insert one row and return its id.
    pub async fn insert_row(&self, name: &str, value: i64) -> StoreResult<i64> {
        let record = NewRecord::new(name, value);
        record.validate()?;

        let context = self.manager.current().await;
        let id = context.connection()?.insert_row(&record).await?;
        tracing::info!("Inserted row: {}, {}", record.name, record.value);
        Ok(id)
    }

    /// Insert the whole batch atomically. An empty batch is a no-op.
    pub async fn bulk_insert(&self, records: &[NewRecord]) -> StoreResult<usize> {
        for record in records {
            record.validate()?;
        }
        if records.is_empty() {
            return Ok(0);
        }

        let context = self.manager.current().await;
        let inserted = context.connection()?.bulk_insert(records).await?;
        tracing::info!("Inserted {} rows", inserted);
        Ok(inserted)
    }

    /// Every row, or at most `limit`, in backend storage order.
    pub async fn select_all(&self, limit: Option<u32>) -> StoreResult<Vec<Record>> {
        let context = self.manager.current().await;
        let rows = context.connection()?.select_all(limit).await?;
        tracing::debug!("Selected {} rows from {}", rows.len(), self.table());
        Ok(rows)
    }

    /// Set `value` on every row named exactly `name`.
    pub async fn update_row(&self, name: &str, new_value: i64) -> StoreResult<u64> {
        let context = self.manager.current().await;
        let affected = context.connection()?.update_by_name(name, new_value).await?;
        tracing::info!("Updated rows: {}", affected);
        Ok(affected)
    }

    /// Delete every row named exactly `name`.
    pub async fn delete_row(&self, name: &str) -> StoreResult<u64> {
        let context = self.manager.current().await;
        let affected = context.connection()?.delete_by_name(name).await?;
        tracing::info!("Deleted rows: {}", affected);
        Ok(affected)
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let context = self.manager.current().await;
        context.connection()?.count().await
    }
}
