//! Synthetic result sets for the binding benchmarks.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::results::TabularResult;
use crate::types::RowValues;

/// Columns of the synthetic employee result.
pub const EMPLOYEE_COLUMNS: [&str; 6] = ["ID", "Name", "DepartmentId", "Salary", "Active", "Hired"];

/// `rows` employee rows in a deterministic shuffled order. Every seventh row carries a
/// non-numeric `DepartmentId` and every eleventh a NULL `Salary`, so the degrade paths are
/// part of what is measured.
#[must_use]
pub fn employee_result(rows: usize, seed: u64) -> TabularResult {
    let mut ids: Vec<i64> = (1..=rows as i64).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    ids.shuffle(&mut rng);

    let data = ids
        .into_iter()
        .map(|id| {
            vec![
                RowValues::Int(id),
                RowValues::Text(format!("employee-{id}")),
                if id % 7 == 0 {
                    RowValues::Text("n/a".to_string())
                } else {
                    RowValues::Int(id % 12)
                },
                if id % 11 == 0 {
                    RowValues::Null
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    RowValues::Float(30_000.0 + (id % 500) as f64 * 100.0)
                },
                RowValues::Int(id % 2),
                RowValues::Text(format!("2020-01-{:02} 09:00:00", id % 28 + 1)),
            ]
        })
        .collect();

    TabularResult::from_rows(
        EMPLOYEE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        data,
    )
}
