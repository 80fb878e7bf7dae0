//! SQLite driver for the local mode.
//!
//! The store is a single database file, created (along with its parent
//! directory) on first use and opened in WAL mode.

mod connection;

pub use connection::SqliteConnection;
