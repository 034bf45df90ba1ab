//! Domain types for transaction operations.

use chrono::NaiveDate;
use fintrack_shared::types::{AccountId, CategoryId, TransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::balance::BalanceDelta;
use super::polarity::Polarity;

/// A transaction as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning user.
    pub owner: UserId,
    /// Account whose balance carries the effect.
    pub account_id: AccountId,
    /// Category the polarity was resolved from.
    pub category_id: CategoryId,
    /// Polarity copied from the category when the row was written.
    pub polarity: Polarity,
    /// Strictly positive amount; the sign comes from `polarity`.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Calendar date the money moved.
    pub value_date: NaiveDate,
}

impl TransactionRecord {
    /// The effect this transaction has on its account.
    #[must_use]
    pub fn balance_effect(&self) -> BalanceDelta {
        BalanceDelta::effect(self.account_id, self.polarity, self.amount)
    }

    /// The adjustment that removes this transaction's effect.
    #[must_use]
    pub fn reversal(&self) -> BalanceDelta {
        BalanceDelta::reversal(self.account_id, self.polarity, self.amount)
    }

    /// Snapshot used for create/delete audit entries.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.polarity,
            "amount": self.amount,
            "description": self.description,
            "date": self.value_date,
            "account_id": self.account_id,
            "category_id": self.category_id,
        })
    }
}

/// Raw input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Target account.
    pub account_id: AccountId,
    /// Category; its current type decides the polarity.
    pub category_id: CategoryId,
    /// Amount, must be positive.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Value date as `YYYY-MM-DD`; missing or blank means today.
    pub value_date: Option<String>,
}

/// Validated input for creating a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Target account.
    pub account_id: AccountId,
    /// Category; its current type decides the polarity.
    pub category_id: CategoryId,
    /// Positive amount with at most two fractional digits.
    pub amount: Decimal,
    /// Free-text description.
    pub description: String,
    /// Parsed value date.
    pub value_date: NaiveDate,
}

impl NewTransaction {
    /// Builds the record to persist once the polarity has been resolved.
    #[must_use]
    pub fn into_record(self, id: TransactionId, owner: UserId, polarity: Polarity) -> TransactionRecord {
        TransactionRecord {
            id,
            owner,
            account_id: self.account_id,
            category_id: self.category_id,
            polarity,
            amount: self.amount,
            description: self.description,
            value_date: self.value_date,
        }
    }
}

/// Raw input for updating a transaction.
///
/// `None` means "not supplied". A supplied value equal to the stored one is
/// treated as unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// Move the transaction to another account.
    pub account_id: Option<AccountId>,
    /// Re-categorize; re-resolves polarity.
    pub category_id: Option<CategoryId>,
    /// New amount, must be positive.
    pub amount: Option<Decimal>,
    /// New description (an empty string clears it).
    pub description: Option<String>,
    /// New value date as `YYYY-MM-DD`.
    pub value_date: Option<String>,
}

/// Validated update input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    /// Move the transaction to another account.
    pub account_id: Option<AccountId>,
    /// Re-categorize; re-resolves polarity.
    pub category_id: Option<CategoryId>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New value date.
    pub value_date: Option<NaiveDate>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only transactions on this account.
    pub account_id: Option<AccountId>,
    /// Only transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Only income or only expense.
    pub polarity: Option<Polarity>,
    /// Value date lower bound (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Value date upper bound (inclusive).
    pub date_to: Option<NaiveDate>,
}
