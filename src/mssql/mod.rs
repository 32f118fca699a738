// MSSQL module - SQL Server driver for the procedure mapper via Tiberius
//
// - client: connection-string parsing, connect, and the driver trait impls
// - params: binding `RowValues` as Tiberius parameters
// - query: command text, result-set buffering, and value extraction

pub mod client;
pub mod params;
pub mod query;

pub use client::{MssqlClient, TiberiusConnection, TiberiusConnectionFactory, create_mssql_client};
pub use query::{build_command_text, column_data_to_value};
