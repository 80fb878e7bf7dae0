//! Backend type definitions and connection configuration.
//!
//! This module contains:
//! - `Mode` - Which of the two interchangeable backends is active
//! - `DatabaseType` - The driver behind each mode
//! - `ConnectionConfig` - Unified connection configuration
//! - `ConnectionParams` - Backend-specific connection parameters

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default pool acquire timeout, in seconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Operating mode of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Networked MySQL server
    #[default]
    Remote,
    /// Embedded SQLite file
    Local,
}

impl Mode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Remote => Self::Local,
            Self::Local => Self::Remote,
        }
    }

    /// The driver used for this mode.
    pub fn database_type(self) -> DatabaseType {
        match self {
            Self::Remote => DatabaseType::MySQL,
            Self::Local => DatabaseType::SQLite,
        }
    }

    /// Parse from a string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "server" | "mysql" => Some(Self::Remote),
            "local" | "embedded" | "sqlite" => Some(Self::Local),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Get the display name for this database type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Check if this database type is file-based
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::SQLite)
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// SSL mode options for server connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    /// No SSL connection
    Disable,
    /// Try SSL first, fall back to non-SSL
    #[default]
    Prefer,
    /// Require SSL, don't verify certificates
    Require,
    /// Require SSL and verify server certificate
    VerifyCa,
    /// Require SSL, verify certificate and hostname
    VerifyFull,
}

/// Unified connection configuration for both backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// User-friendly name for this connection
    pub name: String,
    /// The type of database
    pub database_type: DatabaseType,
    /// Connection parameters (varies by database type)
    pub params: ConnectionParams,
    /// How long a pool waits for a connection before giving up
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_acquire_timeout() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

impl ConnectionConfig {
    /// Create a new connection configuration
    pub fn new(name: String, database_type: DatabaseType, params: ConnectionParams) -> Self {
        Self {
            name,
            database_type,
            params,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }

    /// Override the pool acquire timeout
    pub fn with_acquire_timeout(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs.max(1);
        self
    }

    /// Validate that the params match the database type
    pub fn validate(&self) -> Result<(), String> {
        match (self.database_type.is_file_based(), &self.params) {
            (true, ConnectionParams::Server { .. }) => Err(format!(
                "{} requires file connection parameters",
                self.database_type.display_name()
            )),
            (false, ConnectionParams::File { .. }) => Err(format!(
                "{} requires server connection parameters",
                self.database_type.display_name()
            )),
            _ => Ok(()),
        }
    }

    /// Human-readable descriptor: `user@host:port/database` or the file path.
    pub fn display_name(&self) -> String {
        match &self.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                database,
                ..
            } => format!("{}@{}:{}/{}", username, hostname, port, database),
            ConnectionParams::File { path } => path.display().to_string(),
        }
    }
}

/// Connection parameters for the two backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionParams {
    /// Server-based database (MySQL)
    Server {
        /// Server hostname or IP address
        hostname: String,
        /// Server port
        port: u16,
        /// Username for authentication
        username: String,
        /// Password for authentication
        #[serde(skip_serializing, default)]
        password: String,
        /// Database to connect to
        database: String,
        /// SSL mode for the connection
        #[serde(default)]
        ssl_mode: SslMode,
    },

    /// File-based database (SQLite)
    File {
        /// Path to the database file
        path: PathBuf,
    },
}

impl ConnectionParams {
    /// Create new server connection parameters
    pub fn server(
        hostname: String,
        port: u16,
        username: String,
        password: String,
        database: String,
    ) -> Self {
        Self::Server {
            hostname,
            port,
            username,
            password,
            database,
            ssl_mode: SslMode::default(),
        }
    }

    /// Create new file connection parameters
    pub fn file(path: PathBuf) -> Self {
        Self::File { path }
    }

    /// Get the file path if this is a file connection
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::File { path } => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_params() -> ConnectionParams {
        ConnectionParams::server(
            "localhost".to_string(),
            3306,
            "user".to_string(),
            "pass".to_string(),
            "db".to_string(),
        )
    }

    #[test]
    fn test_mode_toggle_round_trips() {
        assert_eq!(Mode::Remote.toggled(), Mode::Local);
        assert_eq!(Mode::Local.toggled(), Mode::Remote);
        assert_eq!(Mode::Remote.toggled().toggled(), Mode::Remote);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("remote"), Some(Mode::Remote));
        assert_eq!(Mode::parse(" LOCAL "), Some(Mode::Local));
        assert_eq!(Mode::parse("sqlite"), Some(Mode::Local));
        assert_eq!(Mode::parse("postgres"), None);
        assert_eq!(Mode::Local.to_string(), "LOCAL");
    }

    #[test]
    fn test_mode_database_type() {
        assert_eq!(Mode::Remote.database_type(), DatabaseType::MySQL);
        assert_eq!(Mode::Local.database_type(), DatabaseType::SQLite);
        assert!(DatabaseType::SQLite.is_file_based());
        assert!(!DatabaseType::MySQL.is_file_based());
    }

    #[test]
    fn test_connection_config_validation() {
        let config = ConnectionConfig::new("r".to_string(), DatabaseType::MySQL, server_params());
        assert!(config.validate().is_ok());

        let config = ConnectionConfig::new(
            "r".to_string(),
            DatabaseType::MySQL,
            ConnectionParams::file(PathBuf::from("/tmp/test.db")),
        );
        assert!(config.validate().is_err());

        let config = ConnectionConfig::new("l".to_string(), DatabaseType::SQLite, server_params());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_name() {
        let config = ConnectionConfig::new("r".to_string(), DatabaseType::MySQL, server_params());
        assert_eq!(config.display_name(), "user@localhost:3306/db");

        let config = ConnectionConfig::new(
            "l".to_string(),
            DatabaseType::SQLite,
            ConnectionParams::file(PathBuf::from("local.db")),
        );
        assert_eq!(config.display_name(), "local.db");
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = ConnectionConfig::new("r".to_string(), DatabaseType::MySQL, server_params());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("pass\""));
        assert!(!json.contains("password"));

        let back: ConnectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, config.name);
        assert_eq!(back.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn test_acquire_timeout_floor() {
        let config = ConnectionConfig::new("r".to_string(), DatabaseType::MySQL, server_params())
            .with_acquire_timeout(0);
        assert_eq!(config.acquire_timeout_secs, 1);
    }
}
