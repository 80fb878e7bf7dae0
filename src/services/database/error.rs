//! Error taxonomy for the data-access layer.
//!
//! Every variant is recoverable: operations report it to the caller and the
//! process keeps running.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable, rejected authentication, or could not be built.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Missing or malformed table.
    #[error("schema error: {0}")]
    Schema(String),

    /// CSV without usable columns, or a value rejected under strict coercion.
    #[error("import rejected: {0}")]
    ImportValidation(String),

    /// A record violating the data-model invariants.
    #[error("invalid record: {0}")]
    Validation(String),

    /// Any other driver or transport failure.
    #[error("backend failure: {0}")]
    Backend(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// MySQL SQLSTATEs for unknown table / unknown column.
const MYSQL_SCHEMA_STATES: [&str; 2] = ["42S02", "42S22"];

/// SQLite reports schema problems only through the message text.
const SCHEMA_MESSAGE_MARKERS: [&str; 4] = [
    "no such table",
    "no such column",
    "has no column named",
    "doesn't exist",
];

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                let code = db.code();
                let is_schema = code
                    .as_deref()
                    .is_some_and(|c| MYSQL_SCHEMA_STATES.contains(&c))
                    || SCHEMA_MESSAGE_MARKERS
                        .iter()
                        .any(|marker| message.contains(marker));

                if is_schema {
                    StoreError::Schema(message)
                } else {
                    StoreError::Backend(message)
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connectivity(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl StoreError {
    /// Short category label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "connectivity",
            Self::Schema(_) => "schema",
            Self::ImportValidation(_) => "import",
            Self::Validation(_) => "validation",
            Self::Backend(_) => "backend",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
        }
    }
}
