use std::marker::PhantomData;

use tracing::trace;

use super::coerce::Coerce;
use crate::results::{ColumnSet, ResultRow, TabularResult};
use crate::types::RowValues;

/// One settable field of a record: the column it reads and how to store a raw value.
pub struct FieldBinding<T> {
    /// Column name, matched exactly.
    pub column: &'static str,
    /// Coerce `value` into the field. Returns `false` and leaves the field untouched when
    /// the value cannot be represented.
    pub assign: fn(&mut T, &RowValues) -> bool,
}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

/// A record type that can be materialized from result rows.
///
/// Usually implemented with [`impl_from_result_row!`](crate::impl_from_result_row).
/// Bindings are static; they are resolved against a result's columns once per result set.
pub trait FromResultRow: Default + Sized + 'static {
    fn field_bindings() -> &'static [FieldBinding<Self>];
}

/// Store `value` into `slot` if it coerces, otherwise leave `slot` as it is.
pub fn assign_coerced<F: Coerce>(slot: &mut F, value: &RowValues) -> bool {
    match F::coerce(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

/// Field-to-column resolution of `T` against one result set.
pub struct BindPlan<T: FromResultRow> {
    // (binding index, column index) for each field whose column exists
    resolved: Vec<(usize, usize)>,
    _record: PhantomData<fn() -> T>,
}

impl<T: FromResultRow> BindPlan<T> {
    #[must_use]
    pub fn new(columns: &ColumnSet) -> Self {
        let resolved = T::field_bindings()
            .iter()
            .enumerate()
            .filter_map(|(field, binding)| {
                let column = columns.index_of(binding.column);
                if column.is_none() {
                    trace!(
                        column = binding.column,
                        record = std::any::type_name::<T>(),
                        "no column for field; it keeps its default"
                    );
                }
                column.map(|col| (field, col))
            })
            .collect();
        Self {
            resolved,
            _record: PhantomData,
        }
    }

    /// Materialize one row. Never fails; unconvertible fields keep their defaults.
    #[must_use]
    pub fn bind_row(&self, row: &ResultRow) -> T {
        let bindings = T::field_bindings();
        let mut record = T::default();
        for &(field, col) in &self.resolved {
            let binding = &bindings[field];
            let Some(value) = row.get_by_index(col) else {
                continue;
            };
            if !(binding.assign)(&mut record, value) {
                trace!(
                    column = binding.column,
                    kind = value.kind(),
                    record = std::any::type_name::<T>(),
                    "value not convertible; field keeps its default"
                );
            }
        }
        record
    }
}

/// Materialize every row of `result` as a `T`, in order.
///
/// Always returns exactly `result.len()` records. Fields without a matching column, or
/// whose value cannot be converted, are left at their default.
#[must_use]
pub fn bind<T: FromResultRow>(result: &TabularResult) -> Vec<T> {
    let plan = BindPlan::<T>::new(result.columns());
    result.iter().map(|row| plan.bind_row(row)).collect()
}
