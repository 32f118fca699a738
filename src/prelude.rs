//! `use sql_proc_mapper::prelude::*;` brings in the mapper, parameter and result types,
//! the binding trait and the `impl_from_result_row!` macro.

pub use crate::binding::{Coerce, FromResultRow, bind};
pub use crate::call::{ProcedureOutput, ProcedureStatus};
pub use crate::config::{ConnectionConfig, ConnectionStrings, MapperOptions};
pub use crate::error::{ProcMapperError, Result};
pub use crate::impl_from_result_row;
pub use crate::mapper::{CallControl, ProcedureMapper, Records};
pub use crate::params::ParameterSet;
pub use crate::provider::ConnectionProvider;
pub use crate::results::{ResultRow, TabularResult};
pub use crate::types::RowValues;

#[cfg(feature = "mssql")]
pub use crate::mssql::TiberiusConnectionFactory;
