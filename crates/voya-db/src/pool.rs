//! Pool construction and schema maintenance.
//!
//! The request paths only ever hold a connection for one or two statements
//! at a time, so the pool stays small. Schema setup is the `voya db-init`
//! path: create the database when it is missing, apply the embedded
//! migrations, and report per-table row counts.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Schema migrations compiled into the binary from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open a pool against the configured database.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))
}

/// Apply any migrations the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to apply migrations")?;

    info!("database schema is up to date");
    Ok(())
}

/// Create the configured database when it does not exist yet.
///
/// Runs against the server's `postgres` maintenance database, since
/// `CREATE DATABASE` cannot execute inside the database it creates.
/// Identifiers cannot be bound as statement parameters either, so the name
/// is checked against a conservative shape before being interpolated.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let Some(name) = config.database_name() else {
        bail!("database URL {} names no database", config.database_url);
    };
    if !is_plain_identifier(name) {
        bail!("refusing to create database with unusual name {name:?}");
    }

    let maint = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.maintenance_url())
        .await
        .context("failed to connect to the postgres maintenance database")?;

    let present: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&maint)
        .await
        .context("failed to look up pg_database")?;

    if present.is_none() {
        maint
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        info!(db = name, "database created");
    } else {
        info!(db = name, "database already present");
    }

    maint.close().await;
    Ok(())
}

/// Unquoted lower-case PostgreSQL identifier: letter or underscore first,
/// then letters, digits and underscores.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Row counts for every table in the public schema, for the `voya db-init`
/// summary.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT relname::text FROM pg_class \
         WHERE relkind = 'r' AND relnamespace = 'public'::regnamespace \
         ORDER BY relname",
    )
    .fetch_all(pool)
    .await
    .context("failed to list tables")?;

    let mut counts = Vec::with_capacity(tables.len());
    for (table,) in tables {
        // Names come straight out of pg_class, so interpolating them is safe.
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}
