//! Ledger service for transaction planning.
//!
//! This module holds the pure part of the transaction engine: given the
//! stored row and a validated patch it decides the merged row, the balance
//! adjustments and the audit change set. The storage layer only executes
//! the plan inside one unit of work.

use fintrack_shared::types::{AccountId, CategoryId};

use super::balance::{BalanceDelta, lock_order};
use super::polarity::Polarity;
use super::types::{TransactionPatch, TransactionRecord};
use crate::audit::ChangeSet;

/// Everything an update has to write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    /// The merged row to persist.
    pub updated: TransactionRecord,
    /// Removes the old effect from the old account.
    pub reversal: BalanceDelta,
    /// Applies the new effect to the (possibly new) account.
    pub effect: BalanceDelta,
    /// Fields that actually changed, keyed by their audit name.
    pub changes: ChangeSet,
}

impl UpdatePlan {
    /// Returns true if the update changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns true if the balance effect moved, changed sign or changed size.
    #[must_use]
    pub fn touches_balance(&self) -> bool {
        self.reversal.account_id != self.effect.account_id
            || self.reversal.amount + self.effect.amount != rust_decimal::Decimal::ZERO
    }

    /// Balance adjustments in application order: reversal first.
    #[must_use]
    pub const fn deltas(&self) -> [BalanceDelta; 2] {
        [self.reversal, self.effect]
    }

    /// Accounts to lock, ascending.
    #[must_use]
    pub fn lock_order(&self) -> Vec<AccountId> {
        lock_order(&self.deltas())
    }
}

/// Ledger service for transaction planning.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// The category the patch moves the transaction to, if it differs from
    /// the stored one. Its polarity must be resolved fresh before planning.
    #[must_use]
    pub fn category_change(current: &TransactionRecord, patch: &TransactionPatch) -> Option<CategoryId> {
        patch.category_id.filter(|id| *id != current.category_id)
    }

    /// The account the patch moves the transaction to, if it differs from
    /// the stored one. Its ownership must be checked before planning.
    #[must_use]
    pub fn account_change(current: &TransactionRecord, patch: &TransactionPatch) -> Option<AccountId> {
        patch.account_id.filter(|id| *id != current.account_id)
    }

    /// Merges `patch` onto `current`.
    ///
    /// `resolved_polarity` is the current type of the new category when the
    /// category changes; without it the stored polarity is kept.
    #[must_use]
    pub fn plan_update(
        current: &TransactionRecord,
        patch: TransactionPatch,
        resolved_polarity: Option<Polarity>,
    ) -> UpdatePlan {
        let mut updated = current.clone();
        let mut changes = ChangeSet::new();

        if let Some(account_id) = patch.account_id {
            if changes.record("account_id", &current.account_id, &account_id) {
                updated.account_id = account_id;
            }
        }
        if let Some(category_id) = patch.category_id {
            if changes.record("category_id", &current.category_id, &category_id) {
                updated.category_id = category_id;
                let polarity = resolved_polarity.unwrap_or(current.polarity);
                if changes.record("type", &current.polarity, &polarity) {
                    updated.polarity = polarity;
                }
            }
        }
        if let Some(amount) = patch.amount {
            if changes.record("amount", &current.amount, &amount) {
                updated.amount = amount;
            }
        }
        if let Some(description) = patch.description {
            if changes.record("description", current.description.as_str(), description.as_str()) {
                updated.description = description;
            }
        }
        if let Some(value_date) = patch.value_date {
            if changes.record("date", &current.value_date, &value_date) {
                updated.value_date = value_date;
            }
        }

        UpdatePlan {
            reversal: current.reversal(),
            effect: updated.balance_effect(),
            updated,
            changes,
        }
    }
}
