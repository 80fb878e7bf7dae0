//! MySQL connection implementation.
//!
//! This module implements the backend traits for the remote mode using
//! SQLx's MySqlPool.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{MySqlPool, Row};
use std::time::Duration;

use crate::services::database::error::{StoreError, StoreResult};
use crate::services::database::schema::SchemaDefinition;
use crate::services::database::traits::{
    BoxedConnection, ConnectionConfig, ConnectionParams, DatabaseConnection, DatabaseType,
    NewRecord, Record, SslMode, TableOperations,
};

const DIALECT: DatabaseType = DatabaseType::MySQL;

/// MySQL backend handle.
///
/// This struct wraps a lazily-connecting SQLx MySqlPool.
pub struct MySqlConnection {
    config: ConnectionConfig,
    schema: SchemaDefinition,
    pool: MySqlPool,
}

impl std::fmt::Debug for MySqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConnection")
            .field("config", &self.config)
            .field("table", &self.schema.table_name())
            .field("pool", &"<MySqlPool>")
            .finish()
    }
}

impl MySqlConnection {
    /// Build the handle. No connection is made until the pool is first used.
    pub fn open(config: ConnectionConfig, schema: SchemaDefinition) -> StoreResult<Self> {
        let options = Self::build_connect_options(&config)?;

        let pool = MySqlPoolOptions::new()
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

    fn map_ssl_mode(ssl_mode: &SslMode) -> MySqlSslMode {
        match ssl_mode {
            SslMode::Disable => MySqlSslMode::Disabled,
            SslMode::Prefer => MySqlSslMode::Preferred,
            SslMode::Require => MySqlSslMode::Required,
            SslMode::VerifyCa => MySqlSslMode::VerifyCa,
            SslMode::VerifyFull => MySqlSslMode::VerifyIdentity,
        }
    }

    /// Build MySqlConnectOptions from the configuration.
    fn build_connect_options(config: &ConnectionConfig) -> StoreResult<MySqlConnectOptions> {
        match &config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
            } => Ok(MySqlConnectOptions::new()
                .host(hostname)
                .port(*port)
                .username(username)
                .password(password)
                .database(database)
                .ssl_mode(Self::map_ssl_mode(ssl_mode))),
            ConnectionParams::File { .. } => Err(StoreError::Connectivity(
                "MySQL does not support file-based connections".to_string(),
            )),
        }
    }

    fn decode_record(row: &MySqlRow) -> StoreResult<Record> {
        Ok(Record {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl DatabaseConnection for MySqlConnection {
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
impl TableOperations for MySqlConnection {
    async fn create_table(&self) -> StoreResult<()> {
        let sql = self.schema.create_table_sql(DIALECT);
        tracing::debug!("mysql: {}", sql);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn drop_table(&self) -> StoreResult<()> {
        let sql = self.schema.drop_table_sql(DIALECT);
        tracing::debug!("mysql: {}", sql);

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

        Ok(result.last_insert_id() as i64)
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
