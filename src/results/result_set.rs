use std::sync::Arc;

use super::row::{ColumnSet, ResultRow};
use crate::types::RowValues;

/// The buffered first result set of a procedure call.
///
/// Column names are known only at call time and are shared by all rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    columns: Arc<ColumnSet>,
    rows: Vec<ResultRow>,
}

impl TabularResult {
    /// An empty result with the given columns.
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        Self::with_capacity(column_names, 0)
    }

    /// An empty result with preallocated room for `capacity` rows.
    #[must_use]
    pub fn with_capacity(column_names: Vec<String>, capacity: usize) -> Self {
        Self {
            columns: Arc::new(ColumnSet::new(column_names)),
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Build a result from column names and positional row values.
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> Self {
        let mut result = Self::with_capacity(column_names, rows.len());
        for values in rows {
            result.push_values(values);
        }
        result
    }

    /// Append a row; values are positional against this result's columns.
    pub fn push_values(&mut self, values: Vec<RowValues>) {
        self.rows.push(ResultRow::new(Arc::clone(&self.columns), values));
    }

    #[must_use]
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a TabularResult {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for TabularResult {
    type Item = ResultRow;
    type IntoIter = std::vec::IntoIter<ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
