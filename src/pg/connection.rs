use crate::apply::SyncTarget;
use crate::util::{sanitize_connection_error, sanitize_url, ExecutionError, Result, SchemaError};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, Pool, Postgres};
use std::str::FromStr;

pub struct PgConnection {
    pool: Pool<Postgres>,
    host: String,
    database: String,
}

impl PgConnection {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(connection_string).map_err(|e| {
            let sanitized_error = sanitize_connection_error(connection_string, &e.to_string());
            SchemaError::ConfigurationError(format!(
                "Invalid connection string {}: {sanitized_error}",
                sanitize_url(connection_string)
            ))
        })?;

        Self::connect_with(options).await
    }

    pub async fn connect_with(options: PgConnectOptions) -> Result<Self> {
        let host = options.get_host().to_string();
        let database = options
            .get_database()
            .unwrap_or_else(|| options.get_username())
            .to_string();

        // One session per database keeps statements applied in order.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                SchemaError::DatabaseError(format!("Failed to connect to {host} :: {database}: {e}"))
            })?;

        Ok(PgConnection {
            pool,
            host,
            database,
        })
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

impl SyncTarget for PgConnection {
    fn host(&self) -> &str {
        &self.host
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn execute(&self, statement: &str) -> std::result::Result<(), ExecutionError> {
        self.pool
            .execute(statement)
            .await
            .map(|_| ())
            .map_err(|e| ExecutionError::new(e.to_string()))
    }
}
