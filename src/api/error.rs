use crate::config::ConfigError;
use crate::util::SchemaError;
use thiserror::Error;

/// Structured error type for pgdbsync library operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Introspection failed: {message}")]
    Introspection { message: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn introspection(message: impl Into<String>) -> Self {
        Self::Introspection {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::ConfigurationError(_) | SchemaError::SchemaNotSet => {
                Error::configuration(err.to_string())
            }
            SchemaError::DatabaseError(_) | SchemaError::InvalidCatalog(_) => {
                Error::introspection(err.to_string())
            }
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_map_to_categories() {
        assert!(matches!(
            Error::from(SchemaError::SchemaNotSet),
            Error::Configuration { .. }
        ));
        assert!(matches!(
            Error::from(SchemaError::DatabaseError("boom".into())),
            Error::Introspection { message } if message.contains("boom")
        ));
    }
}
