use std::borrow::Cow;

use tiberius::{ColumnData, IntoSql, Query, ToSql};

use crate::call::BoundParameter;
use crate::types::RowValues;

/// Borrowing conversion so bound values do not need to be cloned into the query.
impl<'a> IntoSql<'a> for &'a RowValues {
    fn into_sql(self) -> ColumnData<'a> {
        match self {
            RowValues::Int(i) => ColumnData::I64(Some(*i)),
            RowValues::Float(f) => ColumnData::F64(Some(*f)),
            RowValues::Text(s) => ColumnData::String(Some(Cow::Borrowed(s.as_str()))),
            RowValues::Bool(b) => ColumnData::Bit(Some(*b)),
            RowValues::Timestamp(dt) => dt.to_sql(),
            RowValues::Null => ColumnData::String(None),
            RowValues::JSON(jsval) => ColumnData::String(Some(Cow::Owned(jsval.to_string()))),
            RowValues::Blob(bytes) => ColumnData::Binary(Some(Cow::Borrowed(bytes.as_slice()))),
        }
    }
}

/// Bind every input parameter in order; they become `@P1..@Pn` in the command text.
/// Output parameters are declared in the command text instead of bound.
pub fn bind_inputs<'a>(query: &mut Query<'a>, params: &'a [BoundParameter]) {
    for param in params.iter().filter(|p| !p.is_output()) {
        query.bind(&param.value);
    }
}
