use thiserror::Error;

/// Boxed error coming from the underlying database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used across the crate.
pub type Result<T, E = ProcMapperError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProcMapperError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {message}")]
    ConnectionError {
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    #[error("Query error in procedure `{procedure}`: {message}")]
    QueryError {
        procedure: String,
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Call to procedure `{0}` was cancelled")]
    Cancelled(String),

    #[error("Procedure reported error {code}: {message}")]
    ProcedureFailed { code: i32, message: String },
}

impl ProcMapperError {
    /// Connection failure without an underlying driver error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
            source: None,
        }
    }

    /// Connection failure wrapping the driver's error.
    #[must_use]
    pub fn connection_from(
        message: impl Into<String>,
        source: impl Into<DriverError>,
    ) -> Self {
        Self::ConnectionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Execution failure without an underlying driver error.
    #[must_use]
    pub fn query(procedure: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryError {
            procedure: procedure.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Execution failure wrapping the driver's error.
    #[must_use]
    pub fn query_from(
        procedure: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<DriverError>,
    ) -> Self {
        Self::QueryError {
            procedure: procedure.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }

    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::QueryError { .. })
    }
}
