//! Stored-procedure execution for SQL Server with best-effort mapping of result rows
//! onto caller-defined record types.
//!
//! ```rust,no_run
//! use sql_proc_mapper::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Employee {
//!     id: i32,
//!     name: String,
//!     department_id: i32,
//! }
//!
//! impl_from_result_row!(Employee { id => "ID", name => "Name", department_id => "DepartmentId" });
//!
//! # async fn run() -> Result<()> {
//! let mapper = ProcedureMapper::mssql(ConnectionConfig::from_env("MICONEXION")?);
//! let employees: Vec<Employee> = mapper
//!     .query_as("getEmployee", &ParameterSet::new().with("ID", 1))
//!     .await?;
//! # let _ = employees;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod call;
pub mod config;
pub mod driver;
pub mod error;
pub mod helpers;
pub mod mapper;
pub mod params;
pub mod prelude;
pub mod provider;
pub mod results;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;

#[cfg(feature = "test-utils")]
pub mod test_utils;

#[cfg(feature = "benchmarks")]
pub mod benchmark;

pub use binding::{FromResultRow, bind};
pub use call::{ProcedureCall, ProcedureOutput, ProcedureStatus};
pub use config::{ConnectionConfig, ConnectionStrings, MapperOptions};
pub use error::{ProcMapperError, Result};
pub use mapper::{CallControl, ProcedureMapper, Records};
pub use params::ParameterSet;
pub use provider::{ConnectionProvider, ScopedConnection};
pub use results::{ResultRow, TabularResult};
pub use types::RowValues;
