/// Database layer for the MO26 portal
///
/// Manages the PostgreSQL connection pool, embedded migrations, and the
/// handful of Postgres error codes the managers react to.

use crate::{
    config::DatabaseConfig,
    error::{PortalError, PortalResult},
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{error, info};

/// `undefined_table`
pub const UNDEFINED_TABLE: &str = "42P01";
/// `undefined_column`
pub const UNDEFINED_COLUMN: &str = "42703";
/// `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Create a PostgreSQL connection pool
pub async fn create_pool(config: &DatabaseConfig) -> PortalResult<PgPool> {
    info!("Connecting to PostgreSQL (max connections: {})", config.max_connections);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            PortalError::Database(e)
        })?;

    info!("PostgreSQL connection established");

    Ok(pool)
}

/// Create a pool that connects on first use
pub fn create_lazy_pool(config: &DatabaseConfig) -> PortalResult<PgPool> {
    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect_lazy(&config.url)?)
}

/// Run migrations embedded at compile time from ./migrations
pub async fn run_migrations(pool: &PgPool) -> PortalResult<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        error!("Failed to run migrations: {}", e);
        PortalError::Migration(e)
    })?;

    info!("Migrations completed");

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &PgPool) -> PortalResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check whether a table exists in the public schema
pub async fn table_exists(pool: &PgPool, table: &str) -> PortalResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
        .bind(format!("public.{}", table))
        .fetch_one(pool)
        .await?;

    Ok(exists)
}

/// Postgres SQLSTATE of a database error, if any
pub fn error_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code.into_owned())
}

pub fn is_undefined_table(err: &sqlx::Error) -> bool {
    error_code(err).as_deref() == Some(UNDEFINED_TABLE)
}

/// Undefined-column error whose message names `column`
pub fn is_undefined_column(err: &sqlx::Error, column: &str) -> bool {
    error_code(err).as_deref() == Some(UNDEFINED_COLUMN)
        && err
            .as_database_error()
            .map(|e| e.message().contains(column))
            .unwrap_or(false)
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    error_code(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// Map a missing-table error to `SchemaMissing`, everything else to `Database`
pub fn map_missing_table(err: sqlx::Error, table: &str) -> PortalError {
    if is_undefined_table(&err) {
        PortalError::schema_missing(table)
    } else {
        PortalError::Database(err)
    }
}

/// Reject text longer than a `VARCHAR(max)` column holds
pub fn check_length(field: &'static str, value: &str, max: usize) -> PortalResult<()> {
    if value.chars().count() > max {
        return Err(PortalError::invalid_field(
            field,
            format!("{} must be at most {} characters", field, max),
        ));
    }

    Ok(())
}

/// Whether `value` still fits `NUMERIC(precision, scale)` after Postgres rounds it
pub fn fits_numeric(value: f64, precision: i32, scale: i32) -> bool {
    let factor = 10f64.powi(scale);
    let rounded = (value * factor).round() / factor;
    rounded.is_finite() && rounded.abs() < 10f64.powi(precision - scale)
}

/// Whether `value` is still above zero once rounded to `scale` decimal places
pub fn positive_at_scale(value: f64, scale: i32) -> bool {
    value.is_finite() && (value * 10f64.powi(scale)).round() >= 1.0
}
