//! Helper utilities for testing and development.

use crate::results::TabularResult;
use crate::types::RowValues;

/// Build a result from column names and positional rows.
///
/// Shorthand for tests and fixtures that would otherwise spell out `String` column names.
#[must_use]
pub fn create_test_result(column_names: &[&str], rows: Vec<Vec<RowValues>>) -> TabularResult {
    TabularResult::from_rows(
        column_names.iter().map(|name| (*name).to_string()).collect(),
        rows,
    )
}
