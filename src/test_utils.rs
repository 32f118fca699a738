//! In-memory fixture driver for exercising the mapper without a SQL Server.
//!
//! A [`FixtureDatabase`] holds named procedures, records every parameter bound
//! "server-side", and counts open connections so tests can check release on every path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::call::{
    BoundParameter, ERROR_MESSAGE_PARAM, ERROR_NUMBER_PARAM, ProcedureCall, ProcedureOutput,
    ProcedureStatus,
};
use crate::config::ConnectionConfig;
use crate::driver::{ConnectionFactory, ProcedureConnection};
use crate::error::{ProcMapperError, Result};
use crate::params::ParameterSet;
use crate::provider::ConnectionProvider;
use crate::results::{OutputCollector, TabularResult};

type Handler = dyn Fn(&ParameterSet) -> std::result::Result<FixtureResponse, String> + Send + Sync;

/// What a fixture procedure returns for one call.
#[derive(Debug, Clone, Default)]
pub struct FixtureResponse {
    /// Every result set the procedure produces, in order.
    pub result_sets: Vec<TabularResult>,
    pub status: ProcedureStatus,
}

impl FixtureResponse {
    #[must_use]
    pub fn table(result: TabularResult) -> Self {
        Self {
            result_sets: vec![result],
            status: ProcedureStatus::default(),
        }
    }

    #[must_use]
    pub fn with_result_set(mut self, result: TabularResult) -> Self {
        self.result_sets.push(result);
        self
    }

    #[must_use]
    pub fn with_status(mut self, error_number: i32, error_message: impl Into<String>) -> Self {
        self.status = ProcedureStatus {
            error_number: Some(error_number),
            error_message: Some(error_message.into()),
        };
        self
    }
}

struct FixtureProcedure {
    handler: Box<Handler>,
    delay: Option<Duration>,
}

/// A call as the fixture server saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub procedure: String,
    pub parameters: Vec<BoundParameter>,
}

impl RecordedCall {
    /// Bound parameter by its `@`-prefixed name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&BoundParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

#[derive(Default)]
struct FixtureState {
    procedures: Mutex<HashMap<String, Arc<FixtureProcedure>>>,
    calls: Mutex<Vec<RecordedCall>>,
    accepted: Mutex<Vec<String>>,
    open: AtomicUsize,
    opened_total: AtomicUsize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixture server plus its [`ConnectionFactory`].
#[derive(Clone, Default)]
pub struct FixtureDatabase {
    state: Arc<FixtureState>,
}

impl FixtureDatabase {
    /// A fixture accepting exactly `connection_string`; any other string fails to connect.
    #[must_use]
    pub fn new(connection_string: &str) -> Self {
        let db = Self::default();
        lock(&db.state.accepted).push(connection_string.to_string());
        db
    }

    /// Register `name` to return the same response on every call.
    #[must_use]
    pub fn with_procedure(self, name: &str, response: FixtureResponse) -> Self {
        self.register(name, None, move |_| Ok(response.clone()));
        self
    }

    /// Register `name` with a handler that sees the call's parameters. An `Err` is
    /// reported as a server-side execution error.
    pub fn register<F>(&self, name: &str, delay: Option<Duration>, handler: F)
    where
        F: Fn(&ParameterSet) -> std::result::Result<FixtureResponse, String>
            + Send
            + Sync
            + 'static,
    {
        lock(&self.state.procedures).insert(
            name.to_string(),
            Arc::new(FixtureProcedure {
                handler: Box::new(handler),
                delay,
            }),
        );
    }

    /// Provider whose connections go to this fixture.
    #[must_use]
    pub fn provider(&self, connection_string: &str) -> ConnectionProvider {
        ConnectionProvider::new(
            ConnectionConfig::new(connection_string),
            Arc::new(self.clone()),
        )
    }

    /// Connections currently open.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Connections opened since creation.
    #[must_use]
    pub fn opened_total(&self) -> usize {
        self.state.opened_total.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }
}

#[async_trait]
impl ConnectionFactory for FixtureDatabase {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn ProcedureConnection>> {
        let accepted = lock(&self.state.accepted)
            .iter()
            .any(|s| s == config.connection_string());
        if !accepted {
            return Err(ProcMapperError::connection(
                "fixture server rejected the connection string",
            ));
        }
        self.state.open.fetch_add(1, Ordering::SeqCst);
        self.state.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixtureConnection {
            state: Arc::clone(&self.state),
        }))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Feed a response through the collector the way a server streams a batch: the
/// procedure's result sets, then the status select when outputs are bound.
fn stream_response(call: &ProcedureCall, response: FixtureResponse) -> ProcedureOutput {
    let mut collector = OutputCollector::new(call.binds_status());
    let mut index = 0;
    for set in response.result_sets {
        collector.begin_set(index, set.column_names().to_vec());
        for row in set {
            if collector.wants_row(index) {
                collector.push_row(index, row.values().to_vec());
            }
        }
        index += 1;
    }
    if call.binds_status() {
        let status = response.status;
        collector.begin_set(
            index,
            vec![ERROR_NUMBER_PARAM.to_string(), ERROR_MESSAGE_PARAM.to_string()],
        );
        collector.push_row(
            index,
            vec![status.error_number.into(), status.error_message.into()],
        );
    }
    collector.finish()
}

struct FixtureConnection {
    state: Arc<FixtureState>,
}

impl Drop for FixtureConnection {
    fn drop(&mut self) {
        self.state.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProcedureConnection for FixtureConnection {
    async fn call_procedure(&mut self, call: &ProcedureCall) -> Result<ProcedureOutput> {
        lock(&self.state.calls).push(RecordedCall {
            procedure: call.name().to_string(),
            parameters: call.bound_parameters(),
        });

        let procedure = lock(&self.state.procedures).get(call.name()).cloned();
        let Some(procedure) = procedure else {
            return Err(ProcMapperError::query(
                call.name(),
                format!("Could not find stored procedure '{}'", call.name()),
            ));
        };

        if let Some(delay) = procedure.delay {
            tokio::time::sleep(delay).await;
        }

        let response = (procedure.handler)(call.parameters())
            .map_err(|message| ProcMapperError::query(call.name(), message))?;
        Ok(stream_response(call, response))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
