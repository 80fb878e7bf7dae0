//! Core backend traits.
//!
//! `DatabaseConnection` covers the handle lifecycle (probe, close) that the
//! connection manager needs. `TableOperations` adds the CRUD contract for
//! the managed table; both drivers implement it in their own dialect.

use async_trait::async_trait;

use super::record::{NewRecord, Record};
use super::types::{ConnectionConfig, DatabaseType};
use crate::services::database::error::StoreResult;

/// Core trait for both backend handles.
///
/// Handles are built lazily: constructing one never touches the network or
/// the filesystem, so failures show up on the first `probe` or operation.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Get the database type for this connection
    fn database_type(&self) -> DatabaseType;

    /// Get the connection configuration
    fn connection_config(&self) -> &ConnectionConfig;

    /// Run a trivial round-trip statement (`SELECT 1`).
    async fn probe(&self) -> StoreResult<()>;

    /// Close the pool and release every connection.
    async fn close(&self);

    /// Get a display name for the current connection.
    fn display_name(&self) -> String {
        self.connection_config().display_name()
    }
}

/// CRUD contract for the managed table.
///
/// Each method runs inside its own transaction: committed on success, rolled
/// back on any error. The pooled connection is returned when the transaction
/// guard drops, whichever way the method exits.
#[async_trait]
pub trait TableOperations: DatabaseConnection {
    /// `CREATE TABLE IF NOT EXISTS`.
    async fn create_table(&self) -> StoreResult<()>;

    /// `DROP TABLE IF EXISTS`.
    async fn drop_table(&self) -> StoreResult<()>;

    /// Insert one row and return its backend-assigned id.
    async fn insert_row(&self, record: &NewRecord) -> StoreResult<i64>;

    /// Insert every row or none of them.
    async fn bulk_insert(&self, records: &[NewRecord]) -> StoreResult<usize>;

    /// Rows in backend storage order, optionally capped.
    async fn select_all(&self, limit: Option<u32>) -> StoreResult<Vec<Record>>;

    /// Set `value` on every row named `name`; returns rows affected.
    async fn update_by_name(&self, name: &str, new_value: i64) -> StoreResult<u64>;

    /// Delete every row named `name`; returns rows affected.
    async fn delete_by_name(&self, name: &str) -> StoreResult<u64>;

    async fn count(&self) -> StoreResult<u64>;
}

/// A boxed backend handle.
pub type BoxedConnection = Box<dyn TableOperations>;
