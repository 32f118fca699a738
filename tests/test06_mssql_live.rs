#![cfg(feature = "mssql")]

//! Runs against a real SQL Server when `SQL_PROC_MAPPER_MSSQL` holds an ADO.NET
//! connection string for a database where procedures may be created.

use sql_proc_mapper::mssql::create_mssql_client;
use sql_proc_mapper::{
    ConnectionConfig, ParameterSet, ProcMapperError, ProcedureMapper, RowValues,
    impl_from_result_row,
};

#[derive(Debug, Default, PartialEq)]
struct Employee {
    id: i32,
    name: String,
    department_id: i32,
}

impl_from_result_row!(Employee {
    id => "ID",
    name => "Name",
    department_id => "DepartmentId",
});

const SETUP: &str = r"
CREATE OR ALTER PROCEDURE dbo.procMapperGetEmployee
    @ID INT,
    @Note VARCHAR(50),
    @NmbError INT OUTPUT,
    @MsgError VARCHAR(MAX) OUTPUT
AS
BEGIN
    SET NOCOUNT ON;
    SELECT @ID AS ID, 'Ana' AS Name, 2 AS DepartmentId, @Note AS Note WHERE @ID = 1;
    SELECT 'discarded' AS Second;
    SET @NmbError = CASE WHEN @Note IS NULL THEN 0 ELSE 7 END;
    SET @MsgError = @Note;
END";

#[tokio::test]
async fn live_get_employee() -> Result<(), ProcMapperError> {
    let Ok(conn_str) = std::env::var("SQL_PROC_MAPPER_MSSQL") else {
        eprintln!("SQL_PROC_MAPPER_MSSQL not set; skipping live SQL Server test");
        return Ok(());
    };

    let mut client = create_mssql_client(&conn_str).await?;
    client
        .simple_query(SETUP)
        .await
        .map_err(|e| ProcMapperError::query_from("setup", "create procedure", e))?
        .into_results()
        .await
        .map_err(|e| ProcMapperError::query_from("setup", "create procedure", e))?;
    client
        .close()
        .await
        .map_err(|e| ProcMapperError::connection_from("close", e))?;

    let m = ProcedureMapper::mssql(ConnectionConfig::new(conn_str));
    let params = ParameterSet::new()
        .with("ID", 1)
        .with("Note", Option::<String>::None);
    let output = m.execute("dbo.procMapperGetEmployee", &params).await?;
    assert_eq!(output.result.column_names(), ["ID", "Name", "DepartmentId", "Note"]);
    assert_eq!(output.result.rows()[0].get("Note"), Some(&RowValues::Null));
    assert_eq!(output.status.error_number, Some(0));

    let employees: Vec<Employee> = ProcedureMapper::bind(&output.result);
    assert_eq!(
        employees,
        [Employee {
            id: 1,
            name: "Ana".into(),
            department_id: 2
        }]
    );

    let output = m
        .execute(
            "dbo.procMapperGetEmployee",
            &ParameterSet::new().with("ID", 5).with("Note", "flagged"),
        )
        .await?;
    assert!(output.result.is_empty());
    assert_eq!(output.status.error_number, Some(7));
    assert_eq!(output.status.error_message.as_deref(), Some("flagged"));

    let err = m
        .execute("dbo.procMapperDoesNotExist", &ParameterSet::new())
        .await
        .expect_err("unknown procedure");
    assert!(err.is_query_error(), "{err}");
    Ok(())
}
