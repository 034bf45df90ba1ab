//! Storage error type.

use fintrack_core::ledger::LedgerError;
use sea_orm::DbErr;

/// Errors raised inside a repository.
///
/// Repositories use this internally so `?` works on both database calls and
/// domain checks; public methods convert it to [`LedgerError`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ledger(e) => e,
            StoreError::Database(e) => Self::Storage(e.to_string()),
        }
    }
}
