//! Database layer for the watchit interactions service.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use interactions_common::{AppError, Config};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Whether `err` is a lost race on a unique constraint or a serialization
/// failure, i.e. something a caller may re-run its read-then-act sequence for.
#[must_use]
pub fn is_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    // SQLSTATE 23505 / 40001 surfaced through drivers that sea-orm cannot classify
    let message = err.to_string();
    message.contains("duplicate key value violates unique constraint")
        || message.contains("could not serialize access")
}

/// Convert a database error into the application taxonomy.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    if is_conflict(&err) {
        AppError::Conflict(err.to_string())
    } else {
        AppError::Database(err.to_string())
    }
}
