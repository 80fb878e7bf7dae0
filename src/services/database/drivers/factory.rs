//! Connection factory for creating backend handles.
//!
//! The factory picks the driver from the configuration's database type.

use super::mysql::MySqlConnection;
use super::sqlite::SqliteConnection;
use crate::services::database::error::{StoreError, StoreResult};
use crate::services::database::schema::SchemaDefinition;
use crate::services::database::traits::{BoxedConnection, ConnectionConfig, DatabaseType};

/// Factory for creating backend handles based on configuration.
///
/// # Example
///
/// ```ignore
/// use dbmanager::services::database::drivers::ConnectionFactory;
///
/// let connection = ConnectionFactory::create(config, SchemaDefinition::default())?;
/// connection.probe().await?;
/// ```
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Create a backend handle for `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connectivity` if the parameters do not fit the
    /// database type or the connect options cannot be built.
    pub fn create(config: ConnectionConfig, schema: SchemaDefinition) -> StoreResult<BoxedConnection> {
        config.validate().map_err(StoreError::Connectivity)?;

        match config.database_type {
            DatabaseType::MySQL => MySqlConnection::boxed(config, schema),
            DatabaseType::SQLite => SqliteConnection::boxed(config, schema),
        }
    }
}
