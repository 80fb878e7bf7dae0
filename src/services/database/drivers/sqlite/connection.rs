//! SQLite connection implementation.
//!
//! This module implements the backend traits for the local mode using
//! SQLx's SqlitePool over a single database file.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;

use crate::services::database::error::{StoreError, StoreResult};
use crate::services::database::schema::SchemaDefinition;
use crate::services::database::traits::{
    BoxedConnection, ConnectionConfig, ConnectionParams, DatabaseConnection, DatabaseType,
    NewRecord, Record, TableOperations,
};

const DIALECT: DatabaseType = DatabaseType::SQLite;

/// SQLite backend handle.
pub struct SqliteConnection {
    config: ConnectionConfig,
    schema: SchemaDefinition,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("config", &self.config)
            .field("table", &self.schema.table_name())
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteConnection {
    /// Build the handle. The file is created on first use.
    pub fn open(config: ConnectionConfig, schema: SchemaDefinition) -> StoreResult<Self> {
        let options = Self::build_connect_options(&config)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);

        Ok(Self {
            config,
            schema,
            pool,
        })
    }

    /// Create a boxed connection (for factory use).
    pub fn boxed(config: ConnectionConfig, schema: SchemaDefinition) -> StoreResult<BoxedConnection> {
        Ok(Box::new(Self::open(config, schema)?))
    }

    /// Build SqliteConnectOptions from the configuration.
    fn build_connect_options(config: &ConnectionConfig) -> StoreResult<SqliteConnectOptions> {
        match &config.params {
            ConnectionParams::File { path } => {
                Self::ensure_parent_dir(path)?;

                Ok(SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal))
            }
            ConnectionParams::Server { .. } => Err(StoreError::Connectivity(
                "SQLite does not support server-based connections. Use File params.".to_string(),
            )),
        }
    }

    fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Connectivity(format!(
                        "cannot create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })
            }
            _ => Ok(()),
        }
    }

    fn decode_record(row: &SqliteRow) -> StoreResult<Record> {
        Ok(Record {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl DatabaseConnection for SqliteConnection {
    fn database_type(&self) -> DatabaseType {
        DIALECT
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn probe(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TableOperations for SqliteConnection {
    async fn create_table(&self) -> StoreResult<()> {
        let sql = self.schema.create_table_sql(DIALECT);
        tracing::debug!("sqlite: {}", sql);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn drop_table(&self) -> StoreResult<()> {
        let sql = self.schema.drop_table_sql(DIALECT);
        tracing::debug!("sqlite: {}", sql);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_row(&self, record: &NewRecord) -> StoreResult<i64> {
        let sql = self.schema.insert_sql(DIALECT);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(&record.name)
            .bind(record.value)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.last_insert_rowid())
    }

    async fn bulk_insert(&self, records: &[NewRecord]) -> StoreResult<usize> {
        let sql = self.schema.insert_sql(DIALECT);

        // Dropping `tx` on an early return rolls the whole batch back.
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(&sql)
                .bind(&record.name)
                .bind(record.value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(records.len())
    }

    async fn select_all(&self, limit: Option<u32>) -> StoreResult<Vec<Record>> {
        let sql = self.schema.select_sql(DIALECT, limit);

        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(&sql).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        rows.iter().map(Self::decode_record).collect()
    }

    async fn update_by_name(&self, name: &str, new_value: i64) -> StoreResult<u64> {
        let sql = self.schema.update_value_sql(DIALECT);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql)
            .bind(new_value)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_name(&self, name: &str) -> StoreResult<u64> {
        let sql = self.schema.delete_by_name_sql(DIALECT);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&sql).bind(name).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> StoreResult<u64> {
        let sql = self.schema.count_sql(DIALECT);

        let mut tx = self.pool.begin().await?;
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file_config(path: PathBuf) -> ConnectionConfig {
        ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::SQLite,
            ConnectionParams::file(path),
        )
    }

    #[test]
    fn test_build_connect_options_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.db");

        assert!(SqliteConnection::build_connect_options(&file_config(path)).is_ok());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_server_params_rejected() {
        let config = ConnectionConfig::new(
            "test".to_string(),
            DatabaseType::SQLite,
            ConnectionParams::server(
                "localhost".to_string(),
                3306,
                "user".to_string(),
                "pass".to_string(),
                "db".to_string(),
            ),
        );

        let result = SqliteConnection::build_connect_options(&config);
        assert!(matches!(result, Err(StoreError::Connectivity(_))));
    }

    #[test]
    fn test_probe_and_crud_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path().join("local.db"));

        smol::block_on(async {
            let conn = SqliteConnection::open(config, SchemaDefinition::default()).unwrap();
            conn.probe().await.unwrap();

            conn.create_table().await.unwrap();
            let first = conn.insert_row(&NewRecord::new("Alice", 10)).await.unwrap();
            let second = conn.insert_row(&NewRecord::new("Bob", 20)).await.unwrap();
            assert!(second > first);

            let rows = conn.select_all(None).await.unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].name, "Alice");
            assert!(rows[0].created_at.is_some());

            assert_eq!(conn.select_all(Some(1)).await.unwrap().len(), 1);
            conn.close().await;
        });
    }

    #[test]
    fn test_bulk_insert_rolls_back_after_partial_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path().join("local.db"));

        smol::block_on(async {
            let conn = SqliteConnection::open(config, SchemaDefinition::default()).unwrap();
            conn.create_table().await.unwrap();
            sqlx::query(
                "CREATE TRIGGER reject_poison BEFORE INSERT ON \"records\" \
                 WHEN NEW.name = 'poison' \
                 BEGIN SELECT RAISE(ABORT, 'poison row'); END",
            )
            .execute(&conn.pool)
            .await
            .unwrap();

            let batch = [
                NewRecord::new("Alice", 1),
                NewRecord::new("Bob", 2),
                NewRecord::new("poison", 3),
                NewRecord::new("Carol", 4),
            ];
            let err = conn.bulk_insert(&batch).await.unwrap_err();
            assert!(matches!(err, StoreError::Backend(_)), "got {err:?}");
            assert_eq!(conn.count().await.unwrap(), 0);

            assert_eq!(conn.bulk_insert(&batch[..2]).await.unwrap(), 2);
            assert_eq!(conn.count().await.unwrap(), 2);
        });
    }

    #[test]
    fn test_missing_table_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path().join("local.db"));

        smol::block_on(async {
            let conn = SqliteConnection::open(config, SchemaDefinition::default()).unwrap();
            let err = conn
                .insert_row(&NewRecord::new("Alice", 10))
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::Schema(_)), "got {err:?}");
        });
    }
}
