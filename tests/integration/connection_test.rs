//! Connection integration tests.
//!
//! Tests database connectivity and error handling.

use super::get_postgres_client;
use sqltools::config::{Config, ConnectionConfig};
use sqltools::db::{self, DatabaseBackend, DatabaseClient, PostgresClient, SqliteClient};
use sqltools::error::SqlToolsError;
use std::io::Write;

#[tokio::test]
async fn test_connect_postgres_with_valid_credentials() {
    let Some(client) = get_postgres_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    assert_eq!(client.backend(), DatabaseBackend::Postgres);
    client.close().await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_postgres_with_invalid_host() {
    let config = ConnectionConfig {
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: 5432,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
        ..Default::default()
    };

    let result = PostgresClient::connect(&config).await;
    assert!(matches!(result, Err(SqlToolsError::Connection(_))));
}

#[tokio::test]
async fn test_connect_dispatches_on_backend() {
    let client = db::connect(&ConnectionConfig::sqlite_memory()).await.unwrap();
    assert_eq!(client.backend(), DatabaseBackend::Sqlite);
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_file_survives_reconnect() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = ConnectionConfig::sqlite(file.path().to_string_lossy());

    let client = SqliteClient::connect(&config).await.unwrap();
    client
        .execute_command("CREATE TABLE kept (id INTEGER); INSERT INTO kept VALUES (1), (2);")
        .await
        .unwrap();
    client.close().await.unwrap();

    let client = SqliteClient::connect(&config).await.unwrap();
    let frame = client
        .execute_query("SELECT COUNT(*) AS n FROM kept", &[])
        .await
        .unwrap();
    assert_eq!(frame.rows[0][0].as_i64(), Some(2));
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_named_connection_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[connections.scratch]
backend = "sqlite"
database = ":memory:"
"#
    )
    .unwrap();

    let config = Config::load_from_file(file.path()).unwrap();
    let conn = config.get_connection(Some("scratch")).unwrap();
    assert_eq!(conn.backend, DatabaseBackend::Sqlite);

    let client = db::connect(conn).await.unwrap();
    let frame = client.execute_query("SELECT 1 AS one", &[]).await.unwrap();
    assert_eq!(frame.column_names(), vec!["one"]);
}
