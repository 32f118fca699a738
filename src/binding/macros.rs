/// Implement [`FromResultRow`](crate::binding::FromResultRow) for an existing struct.
///
/// Each entry names a field; `=> "Column"` binds it to a differently named column,
/// otherwise the column must be named exactly like the field. The struct must implement
/// `Default` and every listed field type must implement
/// [`Coerce`](crate::binding::Coerce).
///
/// ```rust
/// use sql_proc_mapper::impl_from_result_row;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Employee {
///     id: i32,
///     name: String,
///     department_id: i32,
/// }
///
/// impl_from_result_row!(Employee {
///     id => "ID",
///     name => "Name",
///     department_id => "DepartmentId",
/// });
/// ```
#[macro_export]
macro_rules! impl_from_result_row {
    (@column $field:ident) => {
        stringify!($field)
    };
    (@column $field:ident $column:literal) => {
        $column
    };
    ($record:ty { $($field:ident $(=> $column:literal)?),* $(,)? }) => {
        impl $crate::binding::FromResultRow for $record {
            fn field_bindings() -> &'static [$crate::binding::FieldBinding<Self>] {
                const BINDINGS: &[$crate::binding::FieldBinding<$record>] = &[
                    $(
                        $crate::binding::FieldBinding {
                            column: $crate::impl_from_result_row!(@column $field $($column)?),
                            assign: |record: &mut $record, value: &$crate::RowValues| {
                                $crate::binding::assign_coerced(&mut record.$field, value)
                            },
                        },
                    )*
                ];
                BINDINGS
            }
        }
    };
}
