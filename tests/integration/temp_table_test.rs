//! Temporary table lifecycle tests.

use super::{get_postgres_client, sqlite_fixture};
use sqltools::db::{DatabaseClient, Value};
use sqltools::error::SqlToolsError;
use sqltools::query::QueryExecutor;
use sqltools::temp::{TempTable, TempTableState};

#[tokio::test]
async fn test_temp_table_from_query_result() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let mut spenders = TempTable::create(
        &executor,
        "spenders",
        "SELECT customer_id, SUM(amount) AS total FROM orders GROUP BY customer_id",
    )
    .await
    .unwrap();

    let frame = executor
        .run_query(
            "SELECT c.name, s.total FROM customers AS c \
             JOIN spenders AS s USING (customer_id) ORDER BY s.total DESC",
        )
        .await
        .unwrap();
    assert_eq!(
        frame.rows,
        vec![
            vec![Value::from("Grace"), Value::Float(47.0)],
            vec![Value::from("Ada"), Value::Float(12.5)],
        ]
    );

    spenders.close().await.unwrap();
    assert_eq!(
        spenders.state(),
        &TempTableState::Closed {
            name: "spenders".to_string()
        }
    );

    let err = spenders.close().await.unwrap_err();
    assert!(matches!(err, SqlToolsError::TempTableClosed(_)));
}

#[tokio::test]
async fn test_closing_temp_table_leaves_permanent_table() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    // Same name as a permanent table: only the temporary one is dropped.
    let mut tt = TempTable::create(&executor, "orders", "SELECT 1 AS x").await.unwrap();
    tt.close().await.unwrap();

    let frame = executor.run_query("SELECT COUNT(*) FROM orders").await.unwrap();
    assert_eq!(frame.rows[0][0].as_i64(), Some(3));
}

#[tokio::test]
async fn test_postgres_select_into_temp() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    let mut tt = TempTable::from_command(
        &executor,
        "SELECT 1 AS test INTO TEMP TABLE sqltools_it_one",
    )
    .await
    .unwrap();
    assert_eq!(tt.name(), "sqltools_it_one");

    let frame = executor.run_query("SELECT * FROM sqltools_it_one").await.unwrap();
    assert_eq!(frame.rows, vec![vec![Value::Int(1)]]);

    tt.close().await.unwrap();
    let err = executor
        .run_query("SELECT * FROM sqltools_it_one")
        .await
        .unwrap_err();
    assert!(matches!(err, SqlToolsError::Query(_)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_mixed_case_temp_name_round_trip() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    let mut first = TempTable::from_command(&executor, "SELECT 1 AS x INTO TEMP TABLE MixedCase")
        .await
        .unwrap();
    assert_eq!(first.name(), "mixedcase");

    // Re-creating drops the existing table first.
    let mut second = TempTable::from_command(&executor, "SELECT 2 AS x INTO TEMP TABLE MixedCase")
        .await
        .unwrap();
    let frame = executor.run_query("SELECT x FROM MixedCase").await.unwrap();
    assert_eq!(frame.rows, vec![vec![Value::Int(2)]]);

    second.close().await.unwrap();
    assert!(!second.is_open());
    assert!(matches!(first.close().await, Err(SqlToolsError::Query(_))));

    client.close().await.unwrap();
}
