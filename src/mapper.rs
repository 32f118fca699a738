//! Stored-procedure execution and typed materialization.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::binding::{FromResultRow, bind};
use crate::call::{ProcedureCall, ProcedureOutput, ProcedureStatus};
use crate::config::{ConnectionConfig, MapperOptions};
use crate::error::{ProcMapperError, Result};
use crate::params::ParameterSet;
use crate::provider::ConnectionProvider;
use crate::results::TabularResult;

/// Caller-side limits for a single call.
#[derive(Debug, Clone, Default)]
pub struct CallControl {
    /// Absolute deadline covering connect and execution.
    pub deadline: Option<Instant>,
    /// Cancels the call when triggered.
    pub cancel: Option<CancellationToken>,
}

impl CallControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Records materialized from a call, with the procedure's status outputs.
#[derive(Debug, Clone, Default)]
pub struct Records<T> {
    pub rows: Vec<T>,
    pub status: ProcedureStatus,
}

/// Executes stored procedures and maps their first result set onto record types.
///
/// Holds no per-call state; clones share the provider and may run calls concurrently.
#[derive(Debug, Clone)]
pub struct ProcedureMapper {
    provider: ConnectionProvider,
    options: MapperOptions,
}

impl ProcedureMapper {
    #[must_use]
    pub fn new(provider: ConnectionProvider, options: MapperOptions) -> Self {
        let provider = provider.with_connect_timeout(options.connect_timeout);
        Self { provider, options }
    }

    /// Mapper on the tiberius SQL Server driver with default options.
    #[cfg(feature = "mssql")]
    #[must_use]
    pub fn mssql(config: ConnectionConfig) -> Self {
        Self::new(ConnectionProvider::mssql(config), MapperOptions::default())
    }

    #[must_use]
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    #[must_use]
    pub fn connection_config(&self) -> &ConnectionConfig {
        self.provider.config()
    }

    /// Run procedure `name` with `parameters` and buffer its first result set.
    ///
    /// # Errors
    ///
    /// - `ParameterError` if the name or a parameter name cannot be bound safely
    /// - `ConnectionError` if the connection cannot be opened
    /// - `QueryError` if execution fails or exceeds the command timeout
    pub async fn execute(&self, name: &str, parameters: &ParameterSet) -> Result<ProcedureOutput> {
        self.execute_with(name, parameters, &CallControl::default())
            .await
    }

    /// [`execute`](Self::execute) with a caller deadline and/or cancellation token.
    ///
    /// # Errors
    ///
    /// As `execute`, plus `Cancelled` when the token fires or the deadline passes.
    pub async fn execute_with(
        &self,
        name: &str,
        parameters: &ParameterSet,
        control: &CallControl,
    ) -> Result<ProcedureOutput> {
        let call = ProcedureCall::new(
            name,
            parameters.clone(),
            self.options.bind_status_parameters,
        )?;
        let cancel = control.cancel.clone().unwrap_or_default();
        let deadline = control.deadline;

        let guarded = async {
            match deadline {
                Some(at) => tokio::time::timeout_at(at, self.run(&call))
                    .await
                    .unwrap_or_else(|_| Err(ProcMapperError::Cancelled(call.name().to_string()))),
                None => self.run(&call).await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(procedure = call.name(), "call cancelled by caller");
                Err(ProcMapperError::Cancelled(call.name().to_string()))
            }
            outcome = guarded => outcome,
        }
    }

    async fn run(&self, call: &ProcedureCall) -> Result<ProcedureOutput> {
        let mut conn = self.provider.open().await?;
        debug!(
            procedure = call.name(),
            parameters = call.parameters().len(),
            "executing procedure"
        );

        let timeout = self.options.command_timeout;
        let outcome = match tokio::time::timeout(timeout, conn.call_procedure(call)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProcMapperError::query(
                call.name(),
                format!("command timed out after {timeout:?}"),
            )),
        };
        conn.release().await;

        match &outcome {
            Ok(output) => {
                debug!(
                    procedure = call.name(),
                    rows = output.result.len(),
                    error_number = ?output.status.error_number,
                    "procedure completed"
                );
                if output.status.is_error() {
                    warn!(
                        procedure = call.name(),
                        error_number = ?output.status.error_number,
                        error_message = ?output.status.error_message,
                        "procedure reported an error status"
                    );
                }
            }
            Err(e) => warn!(procedure = call.name(), error = %e, "procedure call failed"),
        }
        outcome
    }

    /// Materialize every row of `result` as `T`. Never fails; see [`crate::binding::bind`].
    #[must_use]
    pub fn bind<T: FromResultRow>(result: &TabularResult) -> Vec<T> {
        bind(result)
    }

    /// Execute `name` and bind its first result set into `T`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`execute`](Self::execute); binding itself never fails.
    pub async fn query_as<T: FromResultRow>(
        &self,
        name: &str,
        parameters: &ParameterSet,
    ) -> Result<Vec<T>> {
        let output = self.execute(name, parameters).await?;
        Ok(bind(&output.result))
    }

    /// [`query_as`](Self::query_as) that also returns the procedure's status outputs.
    ///
    /// # Errors
    ///
    /// Returns any error from [`execute_with`](Self::execute_with).
    pub async fn query_as_with_status<T: FromResultRow>(
        &self,
        name: &str,
        parameters: &ParameterSet,
        control: &CallControl,
    ) -> Result<Records<T>> {
        let output = self.execute_with(name, parameters, control).await?;
        Ok(Records {
            rows: bind(&output.result),
            status: output.status,
        })
    }
}
