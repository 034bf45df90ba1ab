//! Ledger error types.
//!
//! Every failure a ledger operation can report falls into one of five kinds:
//! malformed input, a missing (or foreign) entity, a business-rule refusal, a
//! storage failure, or an elapsed deadline. Callers map kinds, not variants.

use fintrack_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input; rejected before any unit of work starts.
    InvalidArgument,
    /// Referenced entity absent or not owned by the caller.
    NotFound,
    /// Business-rule refusal.
    Conflict,
    /// Underlying durability layer failure.
    Storage,
    /// The unit of work did not commit before its deadline.
    DeadlineExceeded,
}

impl ErrorKind {
    /// Returns a stable lowercase name for logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed input (non-positive amount, unparseable date, bad name...).
    #[error("{0}")]
    InvalidArgument(String),

    // ========== Lookup Errors ==========
    /// Account not found or owned by someone else.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Category not found, or neither owned by the caller nor a system category.
    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Transaction not found or owned by someone else.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    // ========== Business Rule Errors ==========
    /// The account is the owner's only account.
    #[error("Cannot delete the only account")]
    SoleAccount,

    /// The account still holds transactions.
    #[error("Account has {0} transactions and cannot be deleted")]
    AccountHasTransactions(u64),

    /// The category is still referenced by transactions.
    #[error("Category has {0} transactions and cannot be deleted")]
    CategoryHasTransactions(u64),

    /// System categories are read-only.
    #[error("System categories cannot be modified or deleted")]
    SystemCategory,

    /// A category with the same name and type already exists for this owner.
    #[error("Category '{name}' already exists for type {polarity}")]
    DuplicateCategory {
        /// The conflicting name.
        name: String,
        /// The polarity the name is already used under.
        polarity: String,
    },

    // ========== Infrastructure Errors ==========
    /// Storage failure; the unit of work was rolled back.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The unit of work was abandoned before commit.
    #[error("Operation did not complete before its deadline")]
    DeadlineExceeded,
}

impl LedgerError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AccountNotFound(_) | Self::CategoryNotFound(_) | Self::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::SoleAccount
            | Self::AccountHasTransactions(_)
            | Self::CategoryHasTransactions(_)
            | Self::SystemCategory
            | Self::DuplicateCategory { .. } => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Storage,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::AccountNotFound(_) => "account_not_found",
            Self::CategoryNotFound(_) => "category_not_found",
            Self::TransactionNotFound(_) => "transaction_not_found",
            Self::SoleAccount => "sole_account",
            Self::AccountHasTransactions(_) => "account_has_transactions",
            Self::CategoryHasTransactions(_) => "category_has_transactions",
            Self::SystemCategory => "system_category",
            Self::DuplicateCategory { .. } => "duplicate_category",
            Self::Storage(_) => "internal_error",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Storage => 500,
            ErrorKind::DeadlineExceeded => 504,
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Storage | ErrorKind::DeadlineExceeded)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::InvalidArgument => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::Storage => Self::Database(message),
            ErrorKind::DeadlineExceeded => Self::Timeout(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(LedgerError::InvalidArgument("bad".into()), 400)]
    #[case(LedgerError::AccountNotFound(Uuid::nil()), 404)]
    #[case(LedgerError::CategoryNotFound(Uuid::nil()), 404)]
    #[case(LedgerError::TransactionNotFound(Uuid::nil()), 404)]
    #[case(LedgerError::SoleAccount, 409)]
    #[case(LedgerError::AccountHasTransactions(3), 409)]
    #[case(LedgerError::CategoryHasTransactions(1), 409)]
    #[case(LedgerError::SystemCategory, 409)]
    #[case(LedgerError::Storage("io".into()), 500)]
    #[case(LedgerError::DeadlineExceeded, 504)]
    fn test_http_status_codes(#[case] err: LedgerError, #[case] status: u16) {
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_conversion_to_app_error_keeps_kind() {
        let app: AppError = LedgerError::AccountHasTransactions(2).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::CategoryNotFound(Uuid::nil()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = LedgerError::Storage("connection reset".into()).into();
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::Storage("x".into()).is_retryable());
        assert!(LedgerError::DeadlineExceeded.is_retryable());
        assert!(!LedgerError::SoleAccount.is_retryable());
        assert!(!LedgerError::InvalidArgument("x".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::DuplicateCategory {
            name: "Food".into(),
            polarity: "expense".into(),
        };
        assert_eq!(
            err.to_string(),
            "Category 'Food' already exists for type expense"
        );
        assert_eq!(
            LedgerError::AccountHasTransactions(4).to_string(),
            "Account has 4 transactions and cannot be deleted"
        );
    }
}
