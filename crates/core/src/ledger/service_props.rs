//! Property-based tests for balance consistency.
//!
//! Random sequences of create/update/delete are applied to an in-memory
//! ledger using the same deltas the storage layer applies. After every step
//! each account balance must equal its opening balance plus the signed
//! amounts of the transactions that currently reference it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fintrack_shared::types::{AccountId, CategoryId, TransactionId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::BalanceDelta;
use super::polarity::Polarity;
use super::service::LedgerService;
use super::types::{TransactionPatch, TransactionRecord};

const ACCOUNTS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Create {
        account: usize,
        polarity: Polarity,
        cents: i64,
    },
    Update {
        index: usize,
        account: Option<usize>,
        polarity: Option<Polarity>,
        cents: Option<i64>,
    },
    Delete {
        index: usize,
    },
}

fn polarity() -> impl Strategy<Value = Polarity> {
    prop_oneof![Just(Polarity::Income), Just(Polarity::Expense)]
}

fn cents() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS, polarity(), cents()).prop_map(|(account, polarity, cents)| Op::Create {
            account,
            polarity,
            cents
        }),
        (
            any::<usize>(),
            prop::option::of(0..ACCOUNTS),
            prop::option::of(polarity()),
            prop::option::of(cents()),
        )
            .prop_map(|(index, account, polarity, cents)| Op::Update {
                index,
                account,
                polarity,
                cents
            }),
        any::<usize>().prop_map(|index| Op::Delete { index }),
    ]
}

struct Ledger {
    owner: UserId,
    accounts: Vec<AccountId>,
    opening: BTreeMap<AccountId, Decimal>,
    balances: BTreeMap<AccountId, Decimal>,
    transactions: Vec<TransactionRecord>,
}

impl Ledger {
    fn new(opening_cents: &[i64]) -> Self {
        let accounts: Vec<AccountId> = (0..ACCOUNTS).map(|_| AccountId::new()).collect();
        let opening: BTreeMap<_, _> = accounts
            .iter()
            .zip(opening_cents)
            .map(|(id, cents)| (*id, Decimal::new(*cents, 2)))
            .collect();
        Self {
            owner: UserId::new(),
            balances: opening.clone(),
            opening,
            accounts,
            transactions: Vec::new(),
        }
    }

    fn apply(&mut self, delta: BalanceDelta) {
        *self.balances.entry(delta.account_id).or_default() += delta.amount;
    }

    fn step(&mut self, op: Op) {
        match op {
            Op::Create {
                account,
                polarity,
                cents,
            } => {
                let record = TransactionRecord {
                    id: TransactionId::new(),
                    owner: self.owner,
                    account_id: self.accounts[account],
                    category_id: CategoryId::new(),
                    polarity,
                    amount: Decimal::new(cents, 2),
                    description: String::new(),
                    value_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                };
                self.apply(record.balance_effect());
                self.transactions.push(record);
            }
            Op::Update {
                index,
                account,
                polarity,
                cents,
            } => {
                if self.transactions.is_empty() {
                    return;
                }
                let index = index % self.transactions.len();
                let current = self.transactions[index].clone();
                let patch = TransactionPatch {
                    account_id: account.map(|a| self.accounts[a]),
                    // a polarity change can only come from a category change
                    category_id: polarity.map(|_| CategoryId::new()),
                    amount: cents.map(|c| Decimal::new(c, 2)),
                    ..Default::default()
                };
                let plan = LedgerService::plan_update(&current, patch, polarity);
                if plan.is_noop() {
                    return;
                }
                for delta in plan.deltas() {
                    self.apply(delta);
                }
                self.transactions[index] = plan.updated;
            }
            Op::Delete { index } => {
                if self.transactions.is_empty() {
                    return;
                }
                let removed = self.transactions.remove(index % self.transactions.len());
                self.apply(removed.reversal());
            }
        }
    }

    fn expected(&self, account: AccountId) -> Decimal {
        self.opening[&account]
            + self
                .transactions
                .iter()
                .filter(|t| t.account_id == account)
                .map(|t| t.polarity.signed(t.amount))
                .sum::<Decimal>()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_balance_equals_sum_of_signed_amounts(
        opening in prop::collection::vec(-1_000_000i64..1_000_000i64, ACCOUNTS),
        ops in prop::collection::vec(op(), 1..60),
    ) {
        let mut ledger = Ledger::new(&opening);
        for op in ops {
            ledger.step(op);
            for account in ledger.accounts.clone() {
                prop_assert_eq!(ledger.balances[&account], ledger.expected(account));
            }
        }
    }

    #[test]
    fn prop_update_preserves_total_except_own_change(
        polarity in polarity(),
        old_cents in cents(),
        new_cents in cents(),
        move_account in any::<bool>(),
    ) {
        let mut ledger = Ledger::new(&[0; ACCOUNTS]);
        ledger.step(Op::Create { account: 0, polarity, cents: old_cents });
        let before: Decimal = ledger.balances.values().copied().sum();

        ledger.step(Op::Update {
            index: 0,
            account: move_account.then_some(1),
            polarity: None,
            cents: Some(new_cents),
        });
        let after: Decimal = ledger.balances.values().copied().sum();

        let diff = polarity.signed(Decimal::new(new_cents, 2)) - polarity.signed(Decimal::new(old_cents, 2));
        prop_assert_eq!(after - before, diff);
    }
}
