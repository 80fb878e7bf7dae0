//! MySQL driver for the remote mode.
//!
//! # Example
//!
//! ```ignore
//! use dbmanager::services::database::drivers::mysql::MySqlConnection;
//! use dbmanager::services::SchemaDefinition;
//! use dbmanager::services::database::traits::{ConnectionConfig, ConnectionParams, DatabaseType};
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
//!
//! let conn = MySqlConnection::open(config, SchemaDefinition::default())?;
//! conn.probe().await?;
//! ```

mod connection;

pub use connection::MySqlConnection;
