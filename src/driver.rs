//! Driver seam between the mapper and a concrete database client.
//!
//! A [`ConnectionFactory`] is injected into the [`ConnectionProvider`](crate::ConnectionProvider)
//! and opens one [`ProcedureConnection`] per call.

use async_trait::async_trait;

use crate::call::{ProcedureCall, ProcedureOutput};
use crate::config::ConnectionConfig;
use crate::error::Result;

/// Opens live connections from a connection string.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open and authenticate a connection.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConnectionError` if the connection string is invalid,
    /// the server is unreachable, or the credentials are rejected.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn ProcedureConnection>>;

    /// Driver name for log output.
    fn name(&self) -> &'static str;
}

/// A single open connection able to run stored procedures.
///
/// Dropping the connection must release it; `close` is the graceful path.
#[async_trait]
pub trait ProcedureConnection: Send {
    /// Run `call`, buffering its first result set and reading back the status outputs.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::QueryError` wrapping the driver error if execution fails.
    async fn call_procedure(&mut self, call: &ProcedureCall) -> Result<ProcedureOutput>;

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns `ProcMapperError::ConnectionError` if the driver reports a close failure.
    async fn close(self: Box<Self>) -> Result<()>;
}
