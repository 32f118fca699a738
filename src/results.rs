//! Tabular results returned by procedure calls.

pub(crate) mod collector;
pub mod result_set;
pub mod row;

pub(crate) use collector::OutputCollector;
pub use result_set::TabularResult;
pub use row::{ColumnSet, ResultRow};
