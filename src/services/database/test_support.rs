//! Shared fixtures for backend tests.

use std::path::Path;

use super::manager::{BackendDescriptors, ConnectionManager};
use super::record_store::RecordStore;
use super::schema::SchemaDefinition;
use super::traits::{ConnectionConfig, ConnectionParams, DatabaseType, Mode};

/// A MySQL descriptor nothing listens on; probes fail after one second.
pub fn unreachable_remote() -> ConnectionConfig {
    ConnectionConfig::new(
        "remote".to_string(),
        DatabaseType::MySQL,
        ConnectionParams::server(
            "127.0.0.1".to_string(),
            1,
            "nobody".to_string(),
            "secret".to_string(),
            "none".to_string(),
        ),
    )
    .with_acquire_timeout(1)
}

pub fn descriptors(dir: &Path) -> BackendDescriptors {
    BackendDescriptors {
        remote: unreachable_remote(),
        local: ConnectionConfig::new(
            "local".to_string(),
            DatabaseType::SQLite,
            ConnectionParams::file(dir.join("local_store.db")),
        ),
    }
}

/// A record store over a fresh SQLite file in `dir`, table not yet created.
pub fn local_store(dir: &Path) -> RecordStore {
    let manager = ConnectionManager::new(descriptors(dir), SchemaDefinition::default(), Mode::Local);
    RecordStore::new(manager)
}
