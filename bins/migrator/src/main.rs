//! Database migration runner for FinTrack.
//!
//! Reads `DATABASE_URL` (or a `.env` file).
//!
//! Usage:
//!   migrator up      - Run all pending migrations, seeding system categories
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use fintrack_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI sets up its own tracing.
    cli::run_cli(Migrator).await;
}
