use crate::binding::Coerce;
use crate::call::{ERROR_MESSAGE_PARAM, ERROR_NUMBER_PARAM, ProcedureOutput, ProcedureStatus};
use crate::types::RowValues;

use super::TabularResult;

struct BufferedSet {
    index: usize,
    result: TabularResult,
}

/// Picks the caller's table and the status row out of a batch's result sets as a driver
/// streams them.
///
/// The first result set is buffered in full. With status outputs bound, the most recent
/// later result set keeps its first row only, since the trailing status `SELECT` is one
/// row; every other row is refused before the driver converts it.
pub(crate) struct OutputCollector {
    binds_status: bool,
    first: Option<BufferedSet>,
    trailing: Option<BufferedSet>,
}

impl OutputCollector {
    pub(crate) fn new(binds_status: bool) -> Self {
        Self {
            binds_status,
            first: None,
            trailing: None,
        }
    }

    /// A new result set starts.
    pub(crate) fn begin_set(&mut self, index: usize, columns: Vec<String>) {
        let set = BufferedSet {
            index,
            result: TabularResult::new(columns),
        };
        if self.first.is_none() {
            self.first = Some(set);
        } else if self.binds_status {
            self.trailing = Some(set);
        }
    }

    /// Whether a row of result set `index` would be kept.
    pub(crate) fn wants_row(&self, index: usize) -> bool {
        if self.first.as_ref().is_some_and(|set| set.index == index) {
            return true;
        }
        self.trailing
            .as_ref()
            .is_some_and(|set| set.index == index && set.result.is_empty())
    }

    pub(crate) fn push_row(&mut self, index: usize, values: Vec<RowValues>) {
        if !self.wants_row(index) {
            return;
        }
        let target = match self.first.as_mut() {
            Some(set) if set.index == index => set,
            _ => match self.trailing.as_mut() {
                Some(set) => set,
                None => return,
            },
        };
        target.result.push_values(values);
    }

    pub(crate) fn finish(self) -> ProcedureOutput {
        let (table, status) = if self.binds_status {
            match (self.first, self.trailing) {
                (Some(table), Some(status)) => (Some(table), Some(status)),
                // Only the trailing status select produced a result set.
                (Some(status), None) => (None, Some(status)),
                (None, _) => (None, None),
            }
        } else {
            (self.first, None)
        };

        ProcedureOutput {
            result: table.map(|set| set.result).unwrap_or_default(),
            status: status
                .map(|set| read_status(&set.result))
                .unwrap_or_default(),
        }
    }
}

fn read_status(result: &TabularResult) -> ProcedureStatus {
    let Some(row) = result.rows().first() else {
        return ProcedureStatus::default();
    };
    ProcedureStatus {
        error_number: row
            .get(ERROR_NUMBER_PARAM)
            .and_then(Option::<i32>::coerce)
            .flatten(),
        error_message: row
            .get(ERROR_MESSAGE_PARAM)
            .and_then(Option::<String>::coerce)
            .flatten(),
    }
}
