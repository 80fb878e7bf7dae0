//! Static description of the single managed table.
//!
//! The column set is fixed; only the table name is configurable. SQL is
//! rendered per dialect so both drivers share one source of truth.

use super::error::{StoreError, StoreResult};
use super::traits::DatabaseType;

pub const DEFAULT_TABLE_NAME: &str = "records";

/// Upper bound on `name`, in characters.
pub const NAME_MAX_LEN: usize = 200;

const MAX_IDENTIFIER_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Backend-assigned auto-increment primary key
    SurrogateKey,
    /// Non-null bounded text
    Text { max_len: usize },
    /// Non-null 64-bit integer with a default
    Integer { default: i64 },
    /// Insert timestamp set by the backend
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Column order here is the export order.
pub const COLUMNS: [ColumnDef; 4] = [
    ColumnDef {
        name: "id",
        kind: ColumnKind::SurrogateKey,
    },
    ColumnDef {
        name: "name",
        kind: ColumnKind::Text {
            max_len: NAME_MAX_LEN,
        },
    },
    ColumnDef {
        name: "value",
        kind: ColumnKind::Integer { default: 0 },
    },
    ColumnDef {
        name: "created_at",
        kind: ColumnKind::CreatedAt,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDefinition {
    table_name: String,
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl SchemaDefinition {
    /// Create a definition for `table_name`, which must be a plain identifier.
    pub fn new(table_name: &str) -> StoreResult<Self> {
        let valid_start = table_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_start || !valid_rest || table_name.len() > MAX_IDENTIFIER_LEN {
            return Err(StoreError::Schema(format!(
                "'{}' is not a valid table name",
                table_name
            )));
        }

        Ok(Self {
            table_name: table_name.to_string(),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        COLUMNS.iter().map(|c| c.name).collect()
    }

    fn quote(db: DatabaseType, ident: &str) -> String {
        match db {
            DatabaseType::MySQL => format!("`{}`", ident),
            DatabaseType::SQLite => format!("\"{}\"", ident),
        }
    }

    fn table(&self, db: DatabaseType) -> String {
        Self::quote(db, &self.table_name)
    }

    fn column_sql(db: DatabaseType, column: &ColumnDef) -> String {
        let name = Self::quote(db, column.name);
        let ty = match (column.kind, db) {
            (ColumnKind::SurrogateKey, DatabaseType::MySQL) => {
                "BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY".to_string()
            }
            (ColumnKind::SurrogateKey, DatabaseType::SQLite) => {
                "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
            }
            (ColumnKind::Text { max_len }, _) => format!("VARCHAR({}) NOT NULL", max_len),
            (ColumnKind::Integer { default }, DatabaseType::MySQL) => {
                format!("BIGINT NOT NULL DEFAULT {}", default)
            }
            (ColumnKind::Integer { default }, DatabaseType::SQLite) => {
                format!("INTEGER NOT NULL DEFAULT {}", default)
            }
            (ColumnKind::CreatedAt, _) => "DATETIME DEFAULT CURRENT_TIMESTAMP".to_string(),
        };
        format!("{} {}", name, ty)
    }

    pub fn create_table_sql(&self, db: DatabaseType) -> String {
        let columns = COLUMNS
            .iter()
            .map(|c| Self::column_sql(db, c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table(db), columns)
    }

    pub fn drop_table_sql(&self, db: DatabaseType) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table(db))
    }

    /// Binds: name, value.
    pub fn insert_sql(&self, db: DatabaseType) -> String {
        format!(
            "INSERT INTO {} ({}, {}) VALUES (?, ?)",
            self.table(db),
            Self::quote(db, "name"),
            Self::quote(db, "value")
        )
    }

    pub fn select_sql(&self, db: DatabaseType, limit: Option<u32>) -> String {
        let columns = COLUMNS
            .iter()
            .map(|c| Self::quote(db, c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", columns, self.table(db));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    /// Binds: new value, name.
    pub fn update_value_sql(&self, db: DatabaseType) -> String {
        format!(
            "UPDATE {} SET {} = ? WHERE {} = ?",
            self.table(db),
            Self::quote(db, "value"),
            Self::quote(db, "name")
        )
    }

    /// Binds: name.
    pub fn delete_by_name_sql(&self, db: DatabaseType) -> String {
        format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table(db),
            Self::quote(db, "name")
        )
    }

    pub fn count_sql(&self, db: DatabaseType) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table(db))
    }
}
