//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - Repositories for accounts, categories, transactions, audit log and stats
//! - The transaction engine, which keeps account balances consistent
//! - The background audit queue

pub mod audit;
pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use audit::{AuditDispatcher, AuditWorker};
pub use error::StoreError;
pub use repositories::{
    AccountRepository, AuditRepository, CategoryRepository, StatsRepository,
    TransactionRepository,
};

use std::time::Duration;

use fintrack_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}
