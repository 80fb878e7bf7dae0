mod error;
mod manager;
mod record_store;
mod schema;

pub mod drivers;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{StoreError, StoreResult};
pub use manager::{BackendDescriptors, ConnectionContext, ConnectionManager, ProbeResult};
pub use record_store::RecordStore;
pub use schema::{COLUMNS, ColumnDef, ColumnKind, DEFAULT_TABLE_NAME, NAME_MAX_LEN, SchemaDefinition};
