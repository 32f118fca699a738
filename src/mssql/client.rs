use async_trait::async_trait;
use tiberius::{Client, Config, Query, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use super::params::bind_inputs;
use super::query::{build_command_text, collect_output};
use crate::call::{ProcedureCall, ProcedureOutput};
use crate::config::ConnectionConfig;
use crate::driver::{ConnectionFactory, ProcedureConnection};
use crate::error::{ProcMapperError, Result};

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Parse an ADO.NET connection string and open a SQL Server client.
///
/// Named instances (`Server=host\INSTANCE`) are resolved through SQL Browser. A routing
/// redirect sent by the server (Azure SQL gateways) is followed once.
///
/// # Errors
/// Returns `ProcMapperError::ConnectionError` if the string does not parse, the server
/// cannot be reached, or the login is rejected.
pub async fn create_mssql_client(connection_string: &str) -> Result<MssqlClient> {
    let config = Config::from_ado_string(connection_string)
        .map_err(|e| ProcMapperError::connection_from("invalid connection string", e))?;

    let tcp = TcpStream::connect_named(&config)
        .await
        .map_err(|e| ProcMapperError::connection_from("cannot reach SQL Server", e))?;
    tcp.set_nodelay(true)
        .map_err(|e| ProcMapperError::connection_from("cannot configure socket", e))?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "following SQL Server routing redirect");
            let mut routed = config;
            routed.host(&host);
            routed.port(port);
            let tcp = TcpStream::connect(routed.get_addr())
                .await
                .map_err(|e| ProcMapperError::connection_from("cannot reach routed server", e))?;
            tcp.set_nodelay(true)
                .map_err(|e| ProcMapperError::connection_from("cannot configure socket", e))?;
            Client::connect(routed, tcp.compat_write())
                .await
                .map_err(|e| ProcMapperError::connection_from("SQL Server login failed", e))
        }
        Err(e) => Err(ProcMapperError::connection_from("SQL Server login failed", e)),
    }
}

/// Opens [`TiberiusConnection`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiberiusConnectionFactory;

#[async_trait]
impl ConnectionFactory for TiberiusConnectionFactory {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Box<dyn ProcedureConnection>> {
        let client = create_mssql_client(config.connection_string()).await?;
        debug!("connected to SQL Server");
        Ok(Box::new(TiberiusConnection { client }))
    }

    fn name(&self) -> &'static str {
        "tiberius"
    }
}

/// A live SQL Server connection owned by one call.
pub struct TiberiusConnection {
    client: MssqlClient,
}

#[async_trait]
impl ProcedureConnection for TiberiusConnection {
    async fn call_procedure(&mut self, call: &ProcedureCall) -> Result<ProcedureOutput> {
        let params = call.bound_parameters();
        let mut query = Query::new(build_command_text(call, &params));
        bind_inputs(&mut query, &params);

        let stream = query
            .query(&mut self.client)
            .await
            .map_err(|e| ProcMapperError::query_from(call.name(), "execution failed", e))?;
        collect_output(call, stream).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| ProcMapperError::connection_from("error closing connection", e))
    }
}
