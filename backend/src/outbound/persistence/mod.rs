//! PostgreSQL persistence adapters using Diesel.
//!
//! Concrete implementations of the domain repository ports, backed by
//! `diesel-async` with `bb8` pooling. Row structs (`models`) and table
//! definitions (`schema`) are internal; adapters translate them to domain
//! types and map driver failures onto port error enums.

mod diesel_label_repository;
mod diesel_recipe_repository;
mod diesel_token_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub use diesel_label_repository::{DieselLabelRepository, LabelTable};
pub use diesel_recipe_repository::DieselRecipeRepository;
pub use diesel_token_repository::DieselTokenRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

/// Migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Failures while bringing the schema up to date at startup.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Could not open a connection for the migration run.
    #[error("failed to connect for migrations: {0}")]
    Connection(String),

    /// A migration failed to apply.
    #[error("failed to run migrations: {0}")]
    Migration(String),
}

/// Apply any pending embedded migrations over a fresh blocking connection.
///
/// Runs before the async pool exists, so a plain synchronous connection is
/// the simplest correct tool.
pub fn run_pending_migrations(database_url: &str) -> Result<(), MigrationError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| MigrationError::Connection(err.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| MigrationError::Migration(err.to_string()))?;
    Ok(())
}
