//! Integration tests for sqltools.

pub mod connection_test;
pub mod helpers_test;
pub mod query_test;
pub mod temp_table_test;

use sqltools::config::ConnectionConfig;
use sqltools::db::{DatabaseClient, PostgresClient, SqliteClient};

/// Helper to create a PostgreSQL client from DATABASE_URL.
pub async fn get_postgres_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

/// In-memory SQLite database loaded with a small customers/orders schema.
pub async fn sqlite_fixture() -> SqliteClient {
    let client = SqliteClient::connect(&ConnectionConfig::sqlite_memory())
        .await
        .unwrap();
    client
        .execute_command(
            r#"
            CREATE TABLE customers (
                customer_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                country TEXT
            );
            INSERT INTO customers VALUES
                (1, 'Ada', 'GB'), (2, 'Grace', 'US'), (3, 'Linus', 'FI'),
                (4, 'Barbara', 'US'), (5, 'Ken', 'US'), (6, 'Edsger', NULL);
            CREATE TABLE orders (order_id INTEGER, customer_id INTEGER, amount REAL);
            INSERT INTO orders VALUES (100, 1, 12.5), (101, 2, 40.0), (102, 2, 7.0);
            "#,
        )
        .await
        .unwrap();
    client
}
