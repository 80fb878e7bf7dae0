//! Backend driver implementations.
//!
//! - **MySQL**: the remote mode, via SQLx
//! - **SQLite**: the local embedded mode, via SQLx
//!
//! Each driver implements `DatabaseConnection` and `TableOperations`.

mod factory;

pub mod mysql;
pub mod sqlite;

pub use factory::ConnectionFactory;
