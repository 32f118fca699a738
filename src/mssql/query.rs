use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::TryStreamExt;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, FromSql, QueryItem, QueryStream};

use crate::call::{BoundParameter, ParameterDirection, ProcedureCall, ProcedureOutput};
use crate::error::{ProcMapperError, Result};
use crate::results::OutputCollector;
use crate::types::RowValues;

/// Build the batch that runs `call`.
///
/// Inputs are positional `@P1..@Pn` in the order of `params`. Output parameters are
/// declared as locals, passed with `OUTPUT`, and selected back as the final result set:
///
/// ```sql
/// DECLARE @NmbError INT, @MsgError VARCHAR(MAX);
/// EXEC [dbo].[getEmployee] @ID = @P1, @NmbError = @NmbError OUTPUT, @MsgError = @MsgError OUTPUT;
/// SELECT @NmbError AS [NmbError], @MsgError AS [MsgError];
/// ```
#[must_use]
pub fn build_command_text(call: &ProcedureCall, params: &[BoundParameter]) -> String {
    let mut declares = Vec::new();
    let mut args = Vec::with_capacity(params.len());
    let mut selects = Vec::new();
    let mut position = 0;

    for param in params {
        match param.direction {
            ParameterDirection::Input => {
                position += 1;
                args.push(format!("{} = @P{position}", param.name));
            }
            ParameterDirection::Output(ty) => {
                declares.push(format!("{} {}", param.name, ty.sql_type()));
                args.push(format!("{0} = {0} OUTPUT", param.name));
                selects.push(format!("{} AS [{}]", param.name, param.bare_name()));
            }
        }
    }

    let mut text = String::new();
    if !declares.is_empty() {
        text.push_str(&format!("DECLARE {};\n", declares.join(", ")));
    }
    text.push_str("EXEC ");
    text.push_str(&call.quoted_name());
    if !args.is_empty() {
        text.push(' ');
        text.push_str(&args.join(", "));
    }
    text.push(';');
    if !selects.is_empty() {
        text.push_str(&format!("\nSELECT {};", selects.join(", ")));
    }
    text
}

/// Drain `stream` into the call's output. Rows the collector refuses are skipped
/// without converting their cells.
pub(crate) async fn collect_output(
    call: &ProcedureCall,
    mut stream: QueryStream<'_>,
) -> Result<ProcedureOutput> {
    let mut collector = OutputCollector::new(call.binds_status());

    while let Some(item) = stream.try_next().await.map_err(|e| {
        ProcMapperError::query_from(call.name(), "error while reading results", e)
    })? {
        match item {
            QueryItem::Metadata(meta) => {
                let names = meta.columns().iter().map(|c| c.name().to_string()).collect();
                collector.begin_set(meta.result_index(), names);
            }
            QueryItem::Row(row) => {
                let index = row.result_index();
                if collector.wants_row(index) {
                    let values = row.into_iter().map(column_data_to_value).collect();
                    collector.push_row(index, values);
                }
            }
        }
    }

    Ok(collector.finish())
}

/// Exact text of a decimal, keeping its declared scale (`12.50` stays `12.50`).
fn numeric_text(numeric: Numeric) -> String {
    let scale = usize::from(numeric.scale());
    let value = numeric.value();
    let digits = value.unsigned_abs().to_string();
    let sign = if value < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let digits = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

fn numeric_value(numeric: Numeric) -> RowValues {
    if numeric.scale() == 0 {
        if let Ok(int) = i64::try_from(numeric.value()) {
            return RowValues::Int(int);
        }
    }
    RowValues::Text(numeric_text(numeric))
}

/// Convert one Tiberius cell into a `RowValues`.
#[must_use]
pub fn column_data_to_value(data: ColumnData<'static>) -> RowValues {
    match data {
        ColumnData::Bit(v) => v.map_or(RowValues::Null, RowValues::Bool),
        ColumnData::U8(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I16(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I32(v) => v.map_or(RowValues::Null, |v| RowValues::Int(i64::from(v))),
        ColumnData::I64(v) => v.map_or(RowValues::Null, RowValues::Int),
        ColumnData::F32(v) => v.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        ColumnData::F64(v) => v.map_or(RowValues::Null, RowValues::Float),
        ColumnData::String(v) => v.map_or(RowValues::Null, |s| RowValues::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map_or(RowValues::Null, |g| RowValues::Text(g.to_string())),
        ColumnData::Binary(v) => v.map_or(RowValues::Null, |b| RowValues::Blob(b.into_owned())),
        ColumnData::Numeric(v) => v.map_or(RowValues::Null, numeric_value),
        ColumnData::Xml(v) => v.map_or(RowValues::Null, |x| {
            RowValues::Text(x.into_owned().into_string())
        }),
        ref temporal @ (ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)) => timestamp_value(NaiveDateTime::from_sql(temporal)),
        ref date @ ColumnData::Date(_) => timestamp_value(
            NaiveDate::from_sql(date).map(|d| d.and_then(|d| d.and_hms_opt(0, 0, 0))),
        ),
        ref offset @ ColumnData::DateTimeOffset(_) => timestamp_value(
            DateTime::<Utc>::from_sql(offset).map(|dt| dt.map(|dt| dt.naive_utc())),
        ),
        ref time @ ColumnData::Time(_) => match NaiveTime::from_sql(time) {
            Ok(Some(t)) => RowValues::Text(t.format("%H:%M:%S%.f").to_string()),
            _ => RowValues::Null,
        },
    }
}

fn timestamp_value(parsed: tiberius::Result<Option<NaiveDateTime>>) -> RowValues {
    match parsed {
        Ok(Some(dt)) => RowValues::Timestamp(dt),
        _ => RowValues::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Coerce;
    use crate::params::ParameterSet;
    use std::borrow::Cow;

    #[test]
    fn command_text_binds_inputs_positionally_and_reads_status_back() {
        let params = ParameterSet::new()
            .with("ID", 1)
            .with("Manager", Option::<i32>::None);
        let call = ProcedureCall::new("dbo.getEmployee", params, true).unwrap();
        let text = build_command_text(&call, &call.bound_parameters());
        assert_eq!(
            text,
            "DECLARE @NmbError INT, @MsgError VARCHAR(MAX);\n\
             EXEC [dbo].[getEmployee] @ID = @P1, @Manager = @P2, \
             @NmbError = @NmbError OUTPUT, @MsgError = @MsgError OUTPUT;\n\
             SELECT @NmbError AS [NmbError], @MsgError AS [MsgError];"
        );
    }

    #[test]
    fn command_text_without_status_or_inputs() {
        let call = ProcedureCall::new("listDepartments", ParameterSet::new(), false).unwrap();
        assert_eq!(
            build_command_text(&call, &call.bound_parameters()),
            "EXEC [listDepartments];"
        );
    }

    #[test]
    fn cells_convert_to_row_values() {
        assert_eq!(column_data_to_value(ColumnData::I32(Some(7))), RowValues::Int(7));
        assert_eq!(column_data_to_value(ColumnData::I32(None)), RowValues::Null);
        assert_eq!(
            column_data_to_value(ColumnData::String(Some(Cow::Owned("Ana".into())))),
            RowValues::Text("Ana".into())
        );
        assert_eq!(column_data_to_value(ColumnData::Bit(Some(true))), RowValues::Bool(true));
    }

    #[test]
    fn decimals_convert_exactly() {
        let key = Numeric::new_with_scale(9_007_199_254_740_993, 0);
        assert_eq!(
            column_data_to_value(ColumnData::Numeric(Some(key))),
            RowValues::Int(9_007_199_254_740_993)
        );
        assert_eq!(
            column_data_to_value(ColumnData::Numeric(Some(Numeric::new_with_scale(1250, 2)))),
            RowValues::Text("12.50".into())
        );
        assert_eq!(
            column_data_to_value(ColumnData::Numeric(Some(Numeric::new_with_scale(-5, 3)))),
            RowValues::Text("-0.005".into())
        );
        let wide = Numeric::new_with_scale(123_456_789_012_345_678_901_234_567, 0);
        assert_eq!(
            column_data_to_value(ColumnData::Numeric(Some(wide))),
            RowValues::Text("123456789012345678901234567".into())
        );
        assert_eq!(column_data_to_value(ColumnData::Numeric(None)), RowValues::Null);
    }

    #[test]
    fn decimal_cells_bind_without_precision_loss() {
        let key = column_data_to_value(ColumnData::Numeric(Some(Numeric::new_with_scale(
            9_007_199_254_740_993,
            0,
        ))));
        assert_eq!(i64::coerce(&key), Some(9_007_199_254_740_993));

        let price =
            column_data_to_value(ColumnData::Numeric(Some(Numeric::new_with_scale(1250, 2))));
        assert_eq!(String::coerce(&price), Some("12.50".to_string()));
        assert_eq!(f64::coerce(&price), Some(12.5));
        assert_eq!(i32::coerce(&price), Some(12));

        let half = column_data_to_value(ColumnData::Numeric(Some(Numeric::new_with_scale(250, 2))));
        assert_eq!(i32::coerce(&half), Some(2));
    }
}
