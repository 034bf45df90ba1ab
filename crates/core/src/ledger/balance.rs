//! Account balance effects.
//!
//! A transaction contributes `+amount` (income) or `-amount` (expense) to its
//! account. Every mutation is expressed as a list of [`BalanceDelta`]s so the
//! storage layer can apply them in a fixed order inside one unit of work.

use std::collections::BTreeMap;

use fintrack_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::polarity::Polarity;

/// A signed adjustment to one account's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// The account whose balance changes.
    pub account_id: AccountId,
    /// Signed amount added to the balance.
    pub amount: Decimal,
}

impl BalanceDelta {
    /// The effect of a transaction on its account.
    #[must_use]
    pub fn effect(account_id: AccountId, polarity: Polarity, amount: Decimal) -> Self {
        Self {
            account_id,
            amount: polarity.signed(amount),
        }
    }

    /// The adjustment that undoes [`BalanceDelta::effect`].
    #[must_use]
    pub fn reversal(account_id: AccountId, polarity: Polarity, amount: Decimal) -> Self {
        Self {
            account_id,
            amount: polarity.reversal(amount),
        }
    }

    /// Returns true if applying this delta changes nothing.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Accounts touched by `deltas`, ascending and without duplicates.
///
/// Account rows are locked in this order so two units of work touching the
/// same pair of accounts can never wait on each other in a cycle.
#[must_use]
pub fn lock_order(deltas: &[BalanceDelta]) -> Vec<AccountId> {
    let mut ids: Vec<AccountId> = deltas.iter().map(|d| d.account_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Sums deltas per account.
#[must_use]
pub fn net_by_account(deltas: &[BalanceDelta]) -> BTreeMap<AccountId, Decimal> {
    let mut net = BTreeMap::new();
    for delta in deltas {
        *net.entry(delta.account_id).or_insert(Decimal::ZERO) += delta.amount;
    }
    net
}

/// Balance before and after one step of a running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Balance before this step.
    pub previous: Decimal,
    /// Balance after this step.
    pub current: Decimal,
}

impl RunningBalance {
    /// Starts a running total at `balance`.
    #[must_use]
    pub const fn opening(balance: Decimal) -> Self {
        Self {
            previous: balance,
            current: balance,
        }
    }

    /// Advances the running total by `change`.
    ///
    /// `next.previous == self.current` and `next.current == self.current + change`.
    #[must_use]
    pub fn apply(&self, change: Decimal) -> Self {
        Self {
            previous: self.current,
            current: self.current + change,
        }
    }
}
