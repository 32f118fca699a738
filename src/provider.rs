use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::call::{ProcedureCall, ProcedureOutput};
use crate::config::{ConnectionConfig, DEFAULT_CONNECT_TIMEOUT};
use crate::driver::{ConnectionFactory, ProcedureConnection};
use crate::error::{ProcMapperError, Result};

/// Opens one connection per call from a fixed connection string and an injected driver.
#[derive(Clone)]
pub struct ConnectionProvider {
    config: ConnectionConfig,
    factory: Arc<dyn ConnectionFactory>,
    connect_timeout: Duration,
}

impl fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("config", &self.config)
            .field("driver", &self.factory.name())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl ConnectionProvider {
    #[must_use]
    pub fn new(config: ConnectionConfig, factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            config,
            factory,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Provider backed by the tiberius SQL Server driver.
    #[cfg(feature = "mssql")]
    #[must_use]
    pub fn mssql(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(crate::mssql::TiberiusConnectionFactory))
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a live connection scoped to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConnectionError` if the driver cannot connect within the
    /// connect timeout.
    pub async fn open(&self) -> Result<ScopedConnection> {
        debug!(driver = self.factory.name(), "opening connection");
        let conn = tokio::time::timeout(self.connect_timeout, self.factory.connect(&self.config))
            .await
            .map_err(|_| {
                ProcMapperError::connection(format!(
                    "connect timed out after {:?}",
                    self.connect_timeout
                ))
            })?
            .inspect_err(|e| warn!(driver = self.factory.name(), error = %e, "connect failed"))?;
        Ok(ScopedConnection { inner: Some(conn) })
    }
}

/// An open connection owned by a single call.
///
/// `release` closes it gracefully; dropping it (for example when the owning future is
/// cancelled) drops the driver connection, which closes the socket.
pub struct ScopedConnection {
    inner: Option<Box<dyn ProcedureConnection>>,
}

impl ScopedConnection {
    /// Run a procedure on this connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's `ProcMapperError` on failure.
    pub async fn call_procedure(&mut self, call: &ProcedureCall) -> Result<ProcedureOutput> {
        match self.inner.as_mut() {
            Some(conn) => conn.call_procedure(call).await,
            None => Err(ProcMapperError::connection("connection already released")),
        }
    }

    /// Close the connection. Close failures are logged and swallowed.
    pub async fn release(mut self) {
        if let Some(conn) = self.inner.take() {
            if let Err(e) = conn.close().await {
                warn!(error = %e, "error while closing connection");
            }
        }
    }
}
