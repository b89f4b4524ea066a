//! Introspection helper integration tests.

use super::{get_postgres_client, sqlite_fixture};
use sqltools::db::{DatabaseClient, Value};
use sqltools::helpers;
use sqltools::query::QueryExecutor;
use sqltools::temp::TempTable;

#[tokio::test]
async fn test_head_matches_first_rows_of_full_scan() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let all = executor.run_query("SELECT * FROM customers").await.unwrap();
    let head = helpers::head(&executor, "customers", None).await.unwrap();

    assert_eq!(head.height(), 5);
    assert_eq!(head.columns, all.columns);
    assert_eq!(head.rows[..], all.rows[..5]);
}

#[tokio::test]
async fn test_find_cols_then_filter_with_sql_list() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let cols = helpers::find_cols(&executor, "Country").await.unwrap();
    assert_eq!(cols.height(), 1);
    assert_eq!(cols.get(0, "table_name"), Some(&Value::from("customers")));

    let countries = [Value::from("GB"), Value::from("FI")];
    let sql = format!(
        "SELECT name FROM customers WHERE country IN {} ORDER BY name",
        helpers::to_sql_list(&countries)
    );
    let frame = executor.run_query(&sql).await.unwrap();
    let names: Vec<&str> = frame.rows.iter().filter_map(|r| r[0].as_str()).collect();
    assert_eq!(names, vec!["Ada", "Linus"]);
}

#[tokio::test]
async fn test_unique_and_cols() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let frame = helpers::unique(&executor, "customers", "country").await.unwrap();
    assert_eq!(
        frame.rows,
        vec![
            vec![Value::Null],
            vec![Value::from("FI")],
            vec![Value::from("GB")],
            vec![Value::from("US")],
        ]
    );

    let cols = helpers::get_cols(&executor, "customers").await.unwrap();
    assert_eq!(cols.height(), 3);
}

#[tokio::test]
async fn test_show_temp_tracks_handles() {
    let db = sqlite_fixture().await;
    let executor = QueryExecutor::new(&db);

    let mut us = TempTable::create(
        &executor,
        "us_customers",
        "SELECT * FROM customers WHERE country = 'US'",
    )
    .await
    .unwrap();

    let listed = helpers::show_temp(&executor).await.unwrap();
    assert_eq!(listed.rows, vec![vec![Value::from("us_customers")]]);

    us.close().await.unwrap();
    assert!(helpers::show_temp(&executor).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_postgres_helpers() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    let mut tt = TempTable::create(
        &executor,
        "sqltools_it_items",
        "SELECT g AS item_id, g % 3 AS bucket FROM generate_series(1, 10) AS g",
    )
    .await
    .unwrap();

    let head = helpers::head(&executor, "sqltools_it_items", Some(3)).await.unwrap();
    assert_eq!(head.height(), 3);

    let cols = helpers::get_cols(&executor, "sqltools_it_items").await.unwrap();
    assert_eq!(cols.column_names(), vec!["column_name", "data_type"]);
    assert_eq!(cols.height(), 2);

    let buckets = helpers::unique(&executor, "sqltools_it_items", "bucket").await.unwrap();
    assert_eq!(buckets.height(), 3);

    let temps = helpers::show_temp(&executor).await.unwrap();
    assert!(temps
        .rows
        .iter()
        .any(|r| r[0].as_str() == Some("sqltools_it_items")));

    tt.close().await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_postgres_catalog_search_and_definitions() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(&client);

    executor
        .run_command(
            r#"
            DROP VIEW IF EXISTS pg_temp.sqltools_it_gadget_view;
            DROP TABLE IF EXISTS pg_temp.sqltools_it_gadgets;
            CREATE TEMP TABLE sqltools_it_gadgets (GadgetCode text, gadget_id int);
            CREATE TEMP VIEW sqltools_it_gadget_view AS
                SELECT gadget_id FROM sqltools_it_gadgets WHERE gadget_id > 10;
            CREATE OR REPLACE FUNCTION pg_temp.sqltools_it_double(x int) RETURNS int
                LANGUAGE sql AS 'SELECT x * 2';
            "#,
        )
        .await
        .unwrap();

    // Mixed-case search term; unquoted column names were folded to lower case.
    let cols = helpers::find_cols(&executor, "GaDgEt").await.unwrap();
    assert_eq!(cols.column_names(), vec!["column_name", "table_name"]);
    let ours: Vec<(String, String)> = cols
        .rows
        .iter()
        .map(|r| (r[0].to_display_string(), r[1].to_display_string()))
        .filter(|(_, table)| table.starts_with("sqltools_it_gadget"))
        .collect();
    assert!(ours.contains(&("gadgetcode".to_string(), "sqltools_it_gadgets".to_string())));
    assert!(ours.contains(&("gadget_id".to_string(), "sqltools_it_gadgets".to_string())));
    assert!(ours.contains(&("gadget_id".to_string(), "sqltools_it_gadget_view".to_string())));

    let tables = helpers::find_tables(&executor, "IT_GADGET").await.unwrap();
    let names: Vec<String> = tables
        .column("table_name")
        .unwrap()
        .into_iter()
        .map(Value::to_display_string)
        .collect();
    assert!(names.contains(&"sqltools_it_gadgets".to_string()));
    assert!(names.contains(&"sqltools_it_gadget_view".to_string()));

    let view_def = helpers::get_def(&executor, "sqltools_it_gadget_view")
        .await
        .unwrap()
        .unwrap();
    assert!(view_def.contains("gadget_id"));
    assert!(view_def.contains("sqltools_it_gadgets"));

    let function_def = helpers::get_def(&executor, "sqltools_it_double")
        .await
        .unwrap()
        .unwrap();
    assert!(function_def.contains("FUNCTION"));
    assert!(function_def.contains("sqltools_it_double"));

    assert_eq!(
        helpers::get_def(&executor, "sqltools_it_missing").await.unwrap(),
        None
    );

    executor
        .run_command(
            "DROP FUNCTION pg_temp.sqltools_it_double(int); \
             DROP VIEW pg_temp.sqltools_it_gadget_view; \
             DROP TABLE pg_temp.sqltools_it_gadgets;",
        )
        .await
        .unwrap();
    client.close().await.unwrap();
}
