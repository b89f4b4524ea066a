//! sqltools - run SQL and explore schemas from the shell.

mod cli;
mod logging;

use anyhow::{bail, Context};
use cli::{Cli, Command};
use sqltools::config::{Config, ConnectionConfig};
use sqltools::db::{self, Frame};
use sqltools::error::SqlToolsError;
use sqltools::helpers;
use sqltools::output;
use sqltools::query::QueryExecutor;
use tracing::info;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path, cli.verbose),
        None => logging::init_stderr_logging(cli.verbose),
    }

    if let Err(e) = run(&cli).await {
        let category = e
            .downcast_ref::<SqlToolsError>()
            .map(SqlToolsError::category)
            .unwrap_or("Error");
        eprintln!("{category}: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let Some(connection) = resolve_connection(cli, &config)? else {
        bail!("No database connection configured. Pass --url, --database, or --connection, or set DATABASE_URL.");
    };

    let client = db::connect(&connection).await?;
    let executor = QueryExecutor::new(client.as_ref());

    let result = dispatch(cli, &config, &executor).await;
    client.close().await?;
    let text = result?;

    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

async fn dispatch(cli: &Cli, config: &Config, executor: &QueryExecutor<'_>) -> anyhow::Result<String> {
    let frame: Frame = match &cli.command {
        Command::Query { sql, params } => {
            let params: Vec<_> = params.iter().map(|p| cli::parse_param(p)).collect();
            executor.run_query_with(sql, &params).await?
        }
        Command::Command { sql } => {
            let affected = executor.run_command(sql).await?;
            return Ok(format!("{affected} rows affected"));
        }
        Command::Head { table, rows } => {
            let n = rows.unwrap_or(config.defaults.head_rows);
            helpers::head(executor, table, Some(n)).await?
        }
        Command::FindCols { substring } => helpers::find_cols(executor, substring).await?,
        Command::FindTables { substring } => helpers::find_tables(executor, substring).await?,
        Command::Cols { table } => helpers::get_cols(executor, table).await?,
        Command::Def { name } => {
            return helpers::get_def(executor, name)
                .await?
                .with_context(|| format!("No definition found for '{name}'"));
        }
        Command::Unique { table, column } => helpers::unique(executor, table, column).await?,
        Command::ShowTemp => helpers::show_temp(executor).await?,
    };

    Ok(output::render(&frame, cli.format)?)
}

/// Resolves the connection with precedence: CLI arguments, then the named
/// connection from the config file, then the config's default, then
/// `DATABASE_URL`. Named connections take CLI overrides on top.
fn resolve_connection(cli: &Cli, config: &Config) -> anyhow::Result<Option<ConnectionConfig>> {
    let from_cli = cli.to_connection_config()?;

    let mut connection = match cli.connection_name() {
        Some(name) => {
            let mut named = config
                .get_connection(Some(name))
                .cloned()
                .ok_or_else(|| {
                    SqlToolsError::config(format!("Connection '{name}' not found in config file"))
                })?;
            if let Some(overrides) = &from_cli {
                named.merge(overrides);
            }
            Some(named)
        }
        None => from_cli,
    };

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if connection.is_none() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            connection = Some(ConnectionConfig::from_connection_string(&url)?);
        }
    }

    if let Some(conn) = connection.as_mut() {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
