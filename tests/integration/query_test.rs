//! Query execution integration tests.
//!
//! Tests SQL query execution and result handling.

use super::{get_postgres_client, sqlite_fixture};
use sqltools::db::{DatabaseClient, Value};
use sqltools::error::SqlToolsError;
use sqltools::output::{self, OutputFormat};
use sqltools::query::QueryExecutor;

#[tokio::test]
async fn test_run_query_uses_result_column_names() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = executor
        .run_query("SELECT customer_id AS id, upper(name) AS shout FROM customers ORDER BY id")
        .await
        .unwrap();

    assert_eq!(frame.column_names(), vec!["id", "shout"]);
    assert_eq!(frame.height(), 6);
    assert_eq!(frame.get(0, "shout"), Some(&Value::from("ADA")));
}

#[tokio::test]
async fn test_run_query_keeps_nulls() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = executor
        .run_query("SELECT country FROM customers WHERE name = 'Edsger'")
        .await
        .unwrap();
    assert_eq!(frame.rows, vec![vec![Value::Null]]);
}

#[tokio::test]
async fn test_run_query_with_params() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = executor
        .run_query_with(
            "SELECT name FROM customers WHERE country = ? AND customer_id > ? ORDER BY customer_id",
            &[Value::from("US"), Value::Int(2)],
        )
        .await
        .unwrap();

    let names: Vec<&str> = frame.rows.iter().filter_map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["Barbara", "Ken"]);
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = executor
        .run_query("SELECT order_id, amount FROM orders WHERE amount > 1000")
        .await
        .unwrap();
    assert!(frame.is_empty());
    assert_eq!(frame.column_names(), vec!["order_id", "amount"]);
}

#[tokio::test]
async fn test_run_command_then_query_sees_changes() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let affected = executor
        .run_command("UPDATE customers SET country = 'NL' WHERE country IS NULL")
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let frame = executor
        .run_query("SELECT COUNT(*) FROM customers WHERE country = 'NL'")
        .await
        .unwrap();
    assert_eq!(frame.rows[0][0].as_i64(), Some(1));
}

#[tokio::test]
async fn test_syntax_error_is_query_error() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let err = executor.run_query("SELEC 1").await.unwrap_err();
    assert!(matches!(err, SqlToolsError::Query(_)));
    assert!(err.driver_error().is_some());
}

#[tokio::test]
async fn test_render_query_as_csv() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = executor
        .run_query("SELECT name, country FROM customers WHERE customer_id IN (1, 6) ORDER BY customer_id")
        .await
        .unwrap();
    let csv = output::render(&frame, OutputFormat::Csv).unwrap();
    assert_eq!(csv, "name,country\nAda,GB\nEdsger,\n");
}

#[tokio::test]
async fn test_postgres_simple_select() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    let frame = executor
        .run_query("SELECT 1 AS num, 'hello' AS greeting, NULL::text AS nothing")
        .await
        .unwrap();

    assert_eq!(frame.column_names(), vec!["num", "greeting", "nothing"]);
    assert_eq!(
        frame.rows,
        vec![vec![Value::Int(1), Value::from("hello"), Value::Null]]
    );

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_bound_params() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    let frame = executor
        .run_query_with("SELECT $1::bigint + 1 AS next, $2::text AS label", &[
            Value::Int(41),
            Value::from("x"),
        ])
        .await
        .unwrap();
    assert_eq!(frame.rows, vec![vec![Value::Int(42), Value::from("x")]]);

    client.close().await.unwrap();
}
