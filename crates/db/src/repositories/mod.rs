//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every query is scoped to the calling owner.

pub mod account;
pub mod audit;
pub mod category;
pub mod stats;
pub mod transaction;

pub use account::{
    AccountRepository, CreateAccountInput, DEFAULT_ACCOUNT_NAME, ProvisionOutcome,
    UpdateAccountInput,
};
pub use audit::{AuditActivity, AuditRepository};
pub use category::{CategoryRepository, CreateCategoryInput, UpdateCategoryInput};
pub use stats::StatsRepository;
pub use transaction::{DEFAULT_DEADLINE, TransactionRepository, TransactionWithNames};
