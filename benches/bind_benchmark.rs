//! Criterion measurements of binding cost: the raw `bind` over buffered result sets of
//! several sizes, and a full `query_as` round trip through the fixture driver so the
//! provider, command-timeout and release overhead shows up next to it.

use std::hint::black_box;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_proc_mapper::benchmark::employee_result;
use sql_proc_mapper::test_utils::{FixtureDatabase, FixtureResponse};
use sql_proc_mapper::{MapperOptions, ParameterSet, ProcedureMapper, impl_from_result_row};
use tokio::runtime::Runtime;

const CONN: &str = "Server=bench;Database=hr";

#[derive(Debug, Default)]
#[allow(dead_code)]
struct Employee {
    id: i32,
    name: String,
    department_id: i32,
    salary: Option<f64>,
    active: bool,
    hired: Option<NaiveDateTime>,
}

impl_from_result_row!(Employee {
    id => "ID",
    name => "Name",
    department_id => "DepartmentId",
    salary => "Salary",
    active => "Active",
    hired => "Hired",
});

static TOKIO_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("create tokio runtime"));

fn row_counts() -> Vec<usize> {
    std::env::var("BENCH_ROWS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or_else(|| vec![10, 1_000, 10_000], |n| vec![n])
}

fn bind_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    for rows in row_counts() {
        let result = employee_result(rows, 1_234_567_890);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &result, |b, result| {
            b.iter(|| black_box(ProcedureMapper::bind::<Employee>(result)));
        });
    }
    group.finish();
}

fn query_as_fixture(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_as_fixture");
    for rows in row_counts() {
        let db = FixtureDatabase::new(CONN).with_procedure(
            "listEmployees",
            FixtureResponse::table(employee_result(rows, 42)),
        );
        let mapper = ProcedureMapper::new(db.provider(CONN), MapperOptions::default());
        let params = ParameterSet::new().with("DepartmentId", 3);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_function(BenchmarkId::from_parameter(rows), |b| {
            b.to_async(&*TOKIO_RUNTIME).iter(|| async {
                let employees = mapper
                    .query_as::<Employee>("listEmployees", &params)
                    .await
                    .expect("fixture query");
                black_box(employees)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bind_rows, query_as_fixture);
criterion_main!(benches);
