//! Backend abstraction traits and types.
//!
//! This module provides a unified interface over the two interchangeable
//! backends. It defines:
//!
//! - **Types** (`types`): mode, database type, connection configuration
//! - **Records** (`record`): persisted and to-be-inserted rows
//! - **Connection** (`connection`): handle lifecycle and table operations
//!
//! # Example
//!
//! ```ignore
//! use dbmanager::services::database::traits::{
//!     ConnectionConfig, ConnectionParams, DatabaseType,
//! };
//!
//! let config = ConnectionConfig::new(
//!     "remote".to_string(),
//!     DatabaseType::MySQL,
//!     ConnectionParams::server(
//!         "localhost".to_string(),
//!         3306,
//!         "user".to_string(),
//!         "password".to_string(),
//!         "mydb".to_string(),
//!     ),
//! );
//! ```

pub mod connection;
pub mod record;
pub mod types;

pub use connection::{BoxedConnection, DatabaseConnection, TableOperations};

pub use record::{NewRecord, Record};

pub use types::{ConnectionConfig, ConnectionParams, DatabaseType, Mode, SslMode};
