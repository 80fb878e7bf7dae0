//! Application configuration.
//!
//! Loaded from a JSON file when one exists, otherwise defaults; then
//! `DBMANAGER_*` environment variables override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::services::database::traits::{ConnectionConfig, ConnectionParams, Mode, SslMode};
use crate::services::database::traits::types::DEFAULT_ACQUIRE_TIMEOUT_SECS;
use crate::services::{BackendDescriptors, DEFAULT_TABLE_NAME};

const ENV_PREFIX: &str = "DBMANAGER_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub ssl_mode: SslMode,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            username: "dbmanager".to_string(),
            password: String::new(),
            database: "dbmanager".to_string(),
            ssl_mode: SslMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub path: PathBuf,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("local_emulator.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mode tried first at startup
    pub mode: Mode,
    pub remote: RemoteSettings,
    pub local: LocalSettings,
    pub table_name: String,
    /// Where the scripted run exports to and imports from
    pub csv_path: PathBuf,
    pub acquire_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Remote,
            remote: RemoteSettings::default(),
            local: LocalSettings::default(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            csv_path: PathBuf::from("test_export.csv"),
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                let config: Self = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?;
                tracing::debug!("Loaded config from {:?}", path);
                config
            }
            _ => Self::default(),
        };

        config.apply_overrides(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())?;
        Ok(config)
    }

    /// `$DBMANAGER_CONFIG`, else `<config dir>/dbmanager/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(format!("{}CONFIG", ENV_PREFIX)) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("dbmanager").join("config.json"))
    }

    /// Override fields from `lookup`, keyed without the `DBMANAGER_` prefix.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("MODE") {
            self.mode = Mode::parse(&mode)
                .with_context(|| format!("Unknown mode '{}', expected remote or local", mode))?;
        }
        if let Some(host) = lookup("REMOTE_HOST") {
            self.remote.host = host;
        }
        if let Some(port) = lookup("REMOTE_PORT") {
            self.remote.port = port
                .parse()
                .with_context(|| format!("Invalid remote port '{}'", port))?;
        }
        if let Some(user) = lookup("REMOTE_USER") {
            self.remote.username = user;
        }
        if let Some(password) = lookup("REMOTE_PASSWORD") {
            self.remote.password = password;
        }
        if let Some(database) = lookup("REMOTE_DATABASE") {
            self.remote.database = database;
        }
        if let Some(path) = lookup("LOCAL_PATH") {
            self.local.path = PathBuf::from(path);
        }
        if let Some(table) = lookup("TABLE") {
            self.table_name = table;
        }
        if let Some(path) = lookup("CSV_PATH") {
            self.csv_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("ACQUIRE_TIMEOUT_SECS") {
            self.acquire_timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid acquire timeout '{}'", secs))?;
        }
        Ok(())
    }

    pub fn remote_connection(&self) -> ConnectionConfig {
        let mut params = ConnectionParams::server(
            self.remote.host.clone(),
            self.remote.port,
            self.remote.username.clone(),
            self.remote.password.clone(),
            self.remote.database.clone(),
        );
        if let ConnectionParams::Server { ssl_mode, .. } = &mut params {
            *ssl_mode = self.remote.ssl_mode;
        }

        ConnectionConfig::new(
            Mode::Remote.as_str().to_string(),
            Mode::Remote.database_type(),
            params,
        )
            .with_acquire_timeout(self.acquire_timeout_secs)
    }

    pub fn local_connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(
            Mode::Local.as_str().to_string(),
            Mode::Local.database_type(),
            ConnectionParams::file(self.local.path.clone()),
        )
        .with_acquire_timeout(self.acquire_timeout_secs)
    }

    pub fn descriptors(&self) -> BackendDescriptors {
        BackendDescriptors {
            remote: self.remote_connection(),
            local: self.local_connection(),
        }
    }
}
