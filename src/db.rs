//! Database module
//!
//! Connection pool setup and the bundled schema.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};

use crate::config::Config;

/// `accounts` table with the non-negative balance constraint
pub const SCHEMA: &str = include_str!("../migrations/0001_create_accounts.sql");

/// Seed accounts used by the demo walkthrough
pub const SEED: &str = include_str!("../migrations/0002_seed_accounts.sql");

/// Open a connection pool sized and timed by `config`
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let statement_timeout = config.database_statement_timeout.as_millis().to_string();
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .max_lifetime(config.database_max_lifetime)
        .acquire_timeout(config.database_acquire_timeout)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create the `accounts` table if it does not exist
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA).await?;
    tracing::info!("Schema applied");
    Ok(())
}

/// Insert the seed accounts (skipped when already present)
pub async fn seed(pool: &PgPool) -> Result<(), sqlx::Error> {
    let result = pool.execute(SEED).await?;
    tracing::info!(rows = result.rows_affected(), "Seed accounts inserted");
    Ok(())
}
