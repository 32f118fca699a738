//! Static row-to-record binding.
//!
//! A record type declares its fields once through [`FromResultRow`]; [`bind`] resolves
//! those fields against a result's columns and materializes one record per row.

pub mod coerce;
#[macro_use]
mod macros;
pub mod record;

pub use coerce::Coerce;
pub use record::{BindPlan, FieldBinding, FromResultRow, assign_coerced, bind};
