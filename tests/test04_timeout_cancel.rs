#![cfg(feature = "test-utils")]

use std::time::Duration;

use sql_proc_mapper::helpers::create_test_result;
use sql_proc_mapper::test_utils::{FixtureDatabase, FixtureResponse};
use sql_proc_mapper::{CallControl, MapperOptions, ParameterSet, ProcMapperError, ProcedureMapper, RowValues};
use tokio_util::sync::CancellationToken;

const CONN: &str = "Server=fixture;Database=batch";

fn slow_fixture(delay: Duration) -> FixtureDatabase {
    let db = FixtureDatabase::new(CONN);
    db.register("nightlyRollup", Some(delay), |_| {
        Ok(FixtureResponse::table(create_test_result(
            &["Total"],
            vec![vec![RowValues::Int(42)]],
        )))
    });
    db
}

#[tokio::test]
async fn command_timeout_is_a_query_error() {
    let db = slow_fixture(Duration::from_secs(30));
    let options = MapperOptions::default().with_command_timeout(Duration::from_millis(50));
    let m = ProcedureMapper::new(db.provider(CONN), options);

    let err = m
        .execute("nightlyRollup", &ParameterSet::new())
        .await
        .expect_err("must time out");
    match err {
        ProcMapperError::QueryError { procedure, message, .. } => {
            assert_eq!(procedure, "nightlyRollup");
            assert!(message.contains("timed out"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test]
async fn cancellation_releases_the_connection() {
    let db = slow_fixture(Duration::from_secs(30));
    let m = ProcedureMapper::new(db.provider(CONN), MapperOptions::default());
    let token = CancellationToken::new();
    let control = CallControl::new().with_cancel(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = m
        .execute_with("nightlyRollup", &ParameterSet::new(), &control)
        .await
        .expect_err("must be cancelled");
    canceller.await.expect("canceller task");

    assert!(matches!(err, ProcMapperError::Cancelled(ref name) if name == "nightlyRollup"));
    assert_eq!(db.open_connections(), 0);
    assert_eq!(db.opened_total(), 1);
}

#[tokio::test]
async fn deadline_cancels_the_call() {
    let db = slow_fixture(Duration::from_secs(30));
    let m = ProcedureMapper::new(db.provider(CONN), MapperOptions::default());
    let control = CallControl::new().with_timeout(Duration::from_millis(50));

    let err = m
        .execute_with("nightlyRollup", &ParameterSet::new(), &control)
        .await
        .expect_err("deadline passes");
    assert!(matches!(err, ProcMapperError::Cancelled(_)));
    assert_eq!(db.open_connections(), 0);
}

#[tokio::test]
async fn already_cancelled_token_never_connects() {
    let db = slow_fixture(Duration::from_millis(1));
    let m = ProcedureMapper::new(db.provider(CONN), MapperOptions::default());
    let token = CancellationToken::new();
    token.cancel();

    let err = m
        .execute_with(
            "nightlyRollup",
            &ParameterSet::new(),
            &CallControl::new().with_cancel(token),
        )
        .await
        .expect_err("cancelled up front");
    assert!(matches!(err, ProcMapperError::Cancelled(_)));
    assert_eq!(db.opened_total(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_each_use_their_own_connection() -> Result<(), ProcMapperError> {
    let db = slow_fixture(Duration::from_millis(20));
    let m = ProcedureMapper::new(db.provider(CONN), MapperOptions::default());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let m = m.clone();
        handles.push(tokio::spawn(async move {
            m.execute("nightlyRollup", &ParameterSet::new()).await
        }));
    }
    for handle in handles {
        let output = handle.await.expect("task panicked")?;
        assert_eq!(
            output.result.rows()[0].get("Total"),
            Some(&RowValues::Int(42))
        );
    }

    assert_eq!(db.opened_total(), 16);
    assert_eq!(db.open_connections(), 0);
    Ok(())
}
