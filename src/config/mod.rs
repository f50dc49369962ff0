//! Connection settings for the master and its slaves.
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "schema": "public",
//!   "master": { "host": "10.0.0.1", "dbname": "app", "user": "sync", "password": "..." },
//!   "slaves": [
//!     { "host": "10.0.0.2", "port": 5433, "dbname": "app", "user": "sync" }
//!   ]
//! }
//! ```

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

fn default_port() -> u16 {
    5432
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }

    pub fn label(&self) -> String {
        format!("{} :: {}", self.host, self.dbname)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default)]
    pub schema: Option<String>,
    pub master: DatabaseConfig,
    pub slaves: Vec<DatabaseConfig>,
}

impl SyncConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: SyncConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.slaves.is_empty() {
            return Err(ConfigError::InvalidValue(
                "at least one slave must be configured".to_string(),
            ));
        }
        for database in std::iter::once(&self.master).chain(&self.slaves) {
            if database.host.is_empty() || database.dbname.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "database entry {} needs both host and dbname",
                    database.label()
                )));
            }
        }
        Ok(())
    }
}
