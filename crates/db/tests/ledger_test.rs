//! Transaction engine integration tests: balance effects of create, update
//! and delete, atomicity, ownership and deadlines.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::too_many_lines)]

mod common;

use std::time::Duration;

use common::{FAIL_ON_BALANCE_UPDATE, Ledger};
use fintrack_core::audit::AuditAction;
use fintrack_core::ledger::{
    CreateTransactionInput, ErrorKind, LedgerError, LedgerOperation, Outcome, Polarity,
    TransactionFilter, UpdateTransactionInput,
};
use fintrack_db::entities::{categories, sea_orm_active_enums::CategoryType, transactions};
use fintrack_db::repositories::UpdateAccountInput;
use fintrack_shared::types::{AccountId, CategoryId, PageRequest, TransactionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};

fn input(account: AccountId, category: CategoryId, amount: Decimal) -> CreateTransactionInput {
    CreateTransactionInput {
        account_id: account,
        category_id: category,
        amount,
        description: "test".to_string(),
        value_date: Some("2024-06-01".to_string()),
    }
}

async fn row_count(ledger: &Ledger, account: AccountId) -> u64 {
    transactions::Entity::find()
        .filter(transactions::Column::AccountId.eq(account.into_inner()))
        .count(&ledger.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_income_and_expense_move_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(500.00)).await;
    let salary = ledger.category(Polarity::Income).await;
    let food = ledger.category(Polarity::Expense).await;

    let income = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, salary, dec!(100.00)))
        .await
        .unwrap();
    assert_eq!(income.transaction_type, CategoryType::Income);
    assert_eq!(ledger.balance(account).await, dec!(600.00));

    ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(30.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(570.00));

    let events = ledger.observer.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.outcome == Outcome::Committed));
    assert_eq!(
        events[0].transaction_id,
        Some(TransactionId::from_uuid(income.id))
    );
}

#[tokio::test]
async fn test_expense_on_fresh_account() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(500.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(30.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(470.00));
}

#[tokio::test]
async fn test_amount_update_nets_difference() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(200.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(50.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(150.00));

    let updated = ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                amount: Some(dec!(80.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, dec!(80.00));
    assert_eq!(ledger.balance(account).await, dec!(120.00));

    let entries = ledger.audit.entries();
    let update = entries.last().unwrap();
    assert_eq!(update.action, AuditAction::Update);
    assert_eq!(update.details["changes"]["amount"]["old"], "50.00");
    assert_eq!(update.details["changes"]["amount"]["new"], "80.00");
}

#[tokio::test]
async fn test_amount_update_matches_expected_net() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    // 200.00 once the 50.00 expense is recorded.
    let account = ledger.account(dec!(250.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(50.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(200.00));

    ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                amount: Some(dec!(80.00)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(170.00));
}

#[tokio::test]
async fn test_account_move_restores_both_accounts() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let a = ledger.account(dec!(100.00)).await;
    let b = ledger.account(dec!(100.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(a, food, dec!(25.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(a).await, dec!(75.00));

    ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                account_id: Some(b),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(ledger.balance(a).await, dec!(100.00));
    assert_eq!(ledger.balance(b).await, dec!(75.00));
    assert_eq!(row_count(&ledger, a).await, 0);
    assert_eq!(row_count(&ledger, b).await, 1);
}

#[tokio::test]
async fn test_recategorize_flips_polarity() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(100.00)).await;
    let food = ledger.category(Polarity::Expense).await;
    let refund = ledger.category(Polarity::Income).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(10.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(90.00));

    let updated = ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                category_id: Some(refund),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.transaction_type, CategoryType::Income);
    assert_eq!(ledger.balance(account).await, dec!(110.00));

    let entries = ledger.audit.entries();
    let changes = &entries.last().unwrap().details["changes"];
    assert_eq!(changes["type"]["old"], "expense");
    assert_eq!(changes["type"]["new"], "income");
    assert!(changes.get("category_id").is_some());
}

#[tokio::test]
async fn test_delete_reverses_effect() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(260.00)).await;
    let salary = ledger.category(Polarity::Income).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, salary, dec!(40.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(300.00));

    ledger
        .transactions
        .delete_transaction(ledger.owner, TransactionId::from_uuid(created.id))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(260.00));
    assert_eq!(row_count(&ledger, account).await, 0);

    let deleted = ledger.audit.entries().pop().unwrap();
    assert_eq!(deleted.action, AuditAction::Delete);
    assert_eq!(deleted.details["data"]["amount"], "40.00");

    let again = ledger
        .transactions
        .delete_transaction(ledger.owner, TransactionId::from_uuid(created.id))
        .await;
    assert!(matches!(again, Err(LedgerError::TransactionNotFound(_))));
}

#[tokio::test]
async fn test_failed_balance_update_leaves_nothing_behind() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.named_account(FAIL_ON_BALANCE_UPDATE, dec!(50.00)).await;
    let food = ledger.category(Polarity::Expense).await;
    let audit_before = ledger.audit.entries().len();

    let result = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(20.00)))
        .await;

    assert!(matches!(result, Err(LedgerError::Storage(_))));
    assert_eq!(ledger.balance(account).await, dec!(50.00));
    assert_eq!(row_count(&ledger, account).await, 0);
    assert_eq!(ledger.audit.entries().len(), audit_before);

    let event = ledger.observer.events().pop().unwrap();
    assert_eq!(event.operation, LedgerOperation::CreateTransaction);
    assert_eq!(event.outcome, Outcome::Failed(ErrorKind::Storage));
}

/// A funded account holding one 20.00 expense, then renamed so the test
/// trigger rejects any further balance change.
async fn account_that_rejects_balance_changes(ledger: &Ledger) -> (AccountId, TransactionId) {
    let account = ledger.account(dec!(50.00)).await;
    let food = ledger.category(Polarity::Expense).await;
    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(20.00)))
        .await
        .unwrap();

    ledger
        .accounts
        .update_account(
            ledger.owner,
            account,
            UpdateAccountInput {
                name: Some(FAIL_ON_BALANCE_UPDATE.to_string()),
                balance: None,
            },
        )
        .await
        .unwrap();

    (account, TransactionId::from_uuid(created.id))
}

#[tokio::test]
async fn test_failed_update_rolls_back_reversal() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let (account, id) = account_that_rejects_balance_changes(&ledger).await;
    let audit_before = ledger.audit.entries().len();

    let result = ledger
        .transactions
        .update_transaction(
            ledger.owner,
            id,
            UpdateTransactionInput {
                amount: Some(dec!(35.00)),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(LedgerError::Storage(_))));
    assert_eq!(ledger.balance(account).await, dec!(30.00));
    let stored = ledger.transactions.get_transaction(ledger.owner, id).await.unwrap();
    assert_eq!(stored.amount, dec!(20.00));
    assert_eq!(ledger.audit.entries().len(), audit_before);

    let event = ledger.observer.events().pop().unwrap();
    assert_eq!(event.operation, LedgerOperation::UpdateTransaction);
    assert_eq!(event.outcome, Outcome::Failed(ErrorKind::Storage));
}

#[tokio::test]
async fn test_failed_delete_keeps_row_and_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let (account, id) = account_that_rejects_balance_changes(&ledger).await;
    let audit_before = ledger.audit.entries().len();

    let result = ledger.transactions.delete_transaction(ledger.owner, id).await;

    assert!(matches!(result, Err(LedgerError::Storage(_))));
    assert_eq!(ledger.balance(account).await, dec!(30.00));
    assert_eq!(row_count(&ledger, account).await, 1);
    assert!(ledger.transactions.get_transaction(ledger.owner, id).await.is_ok());
    assert_eq!(ledger.audit.entries().len(), audit_before);

    let event = ledger.observer.events().pop().unwrap();
    assert_eq!(event.operation, LedgerOperation::DeleteTransaction);
    assert_eq!(event.outcome, Outcome::Failed(ErrorKind::Storage));
}

#[tokio::test]
async fn test_zero_deadline_rolls_back() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(10.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let hurried = ledger.transactions.clone().with_deadline(Duration::ZERO);
    let result = hurried
        .create_transaction(ledger.owner, input(account, food, dec!(5.00)))
        .await;

    assert!(matches!(result, Err(LedgerError::DeadlineExceeded)));
    assert_eq!(ledger.balance(account).await, dec!(10.00));
    assert_eq!(row_count(&ledger, account).await, 0);
}

#[tokio::test]
async fn test_foreign_account_and_category_are_not_found() {
    let Some(db) = common::connect().await else {
        return;
    };
    let alice = Ledger::new(db.clone());
    let bob = Ledger::new(db);
    let alice_account = alice.account(dec!(100.00)).await;
    let alice_food = alice.category(Polarity::Expense).await;
    let bob_account = bob.account(dec!(100.00)).await;
    let bob_food = bob.category(Polarity::Expense).await;

    let result = bob
        .transactions
        .create_transaction(bob.owner, input(alice_account, bob_food, dec!(1.00)))
        .await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));

    let result = bob
        .transactions
        .create_transaction(bob.owner, input(bob_account, alice_food, dec!(1.00)))
        .await;
    assert!(matches!(result, Err(LedgerError::CategoryNotFound(_))));

    let alice_tx = alice
        .transactions
        .create_transaction(alice.owner, input(alice_account, alice_food, dec!(1.00)))
        .await
        .unwrap();
    let id = TransactionId::from_uuid(alice_tx.id);

    assert!(matches!(
        bob.transactions.get_transaction(bob.owner, id).await,
        Err(LedgerError::TransactionNotFound(_))
    ));
    assert!(matches!(
        bob.transactions
            .update_transaction(
                bob.owner,
                id,
                UpdateTransactionInput {
                    amount: Some(dec!(2.00)),
                    ..Default::default()
                }
            )
            .await,
        Err(LedgerError::TransactionNotFound(_))
    ));

    // Moving one's own transaction onto a foreign account is refused too.
    assert!(matches!(
        alice
            .transactions
            .update_transaction(
                alice.owner,
                id,
                UpdateTransactionInput {
                    account_id: Some(bob_account),
                    ..Default::default()
                }
            )
            .await,
        Err(LedgerError::AccountNotFound(_))
    ));

    assert_eq!(alice.balance(alice_account).await, dec!(99.00));
    assert_eq!(bob.balance(bob_account).await, dec!(100.00));
}

#[tokio::test]
async fn test_stored_polarity_survives_category_type_change() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(0.00)).await;
    let category = ledger.category(Polarity::Income).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, category, dec!(100.00)))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(100.00));

    // An operator flips the category type behind the engine's back.
    let mut row = categories::Entity::find_by_id(category.into_inner())
        .one(&ledger.db)
        .await
        .unwrap()
        .unwrap()
        .into_active_model();
    row.category_type = Set(CategoryType::Expense);
    row.update(&ledger.db).await.unwrap();

    // The stored income row still reverses as income.
    ledger
        .transactions
        .delete_transaction(ledger.owner, TransactionId::from_uuid(created.id))
        .await
        .unwrap();
    assert_eq!(ledger.balance(account).await, dec!(0.00));

    // New writes pick up the new type.
    let fresh = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, category, dec!(10.00)))
        .await
        .unwrap();
    assert_eq!(fresh.transaction_type, CategoryType::Expense);
    assert_eq!(ledger.balance(account).await, dec!(-10.00));
}

#[tokio::test]
async fn test_noop_update_writes_no_audit_entry() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(100.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(12.50)))
        .await
        .unwrap();
    let audit_before = ledger.audit.entries().len();

    let same = ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                account_id: Some(account),
                amount: Some(dec!(12.5)),
                description: Some("test".to_string()),
                value_date: Some("2024-06-01".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(same.updated_at, created.updated_at);
    assert_eq!(ledger.audit.entries().len(), audit_before);
    assert_eq!(ledger.balance(account).await, dec!(87.50));
}

#[tokio::test]
async fn test_description_only_update_keeps_balance() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(100.00)).await;
    let food = ledger.category(Polarity::Expense).await;

    let created = ledger
        .transactions
        .create_transaction(ledger.owner, input(account, food, dec!(12.50)))
        .await
        .unwrap();

    let updated = ledger
        .transactions
        .update_transaction(
            ledger.owner,
            TransactionId::from_uuid(created.id),
            UpdateTransactionInput {
                description: Some("Groceries".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Groceries");
    assert_eq!(ledger.balance(account).await, dec!(87.50));
    let entries = ledger.audit.entries();
    let changes = &entries.last().unwrap().details["changes"];
    assert_eq!(changes.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_filters_orders_and_pages() {
    let Some(db) = common::connect().await else {
        return;
    };
    let ledger = Ledger::new(db);
    let account = ledger.account(dec!(0.00)).await;
    let salary = ledger.category(Polarity::Income).await;
    let food = ledger.category(Polarity::Expense).await;

    for (category, amount, date) in [
        (salary, dec!(1000.00), "2024-05-01"),
        (food, dec!(12.00), "2024-05-03"),
        (food, dec!(8.00), "2024-05-02"),
        (food, dec!(5.00), "2024-05-03"),
    ] {
        ledger
            .transactions
            .create_transaction(
                ledger.owner,
                CreateTransactionInput {
                    value_date: Some(date.to_string()),
                    ..input(account, category, amount)
                },
            )
            .await
            .unwrap();
    }

    let all = ledger
        .transactions
        .list_transactions(ledger.owner, TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.meta.total, 4);
    let amounts: Vec<Decimal> = all.data.iter().map(|t| t.transaction.amount).collect();
    // Same value date: the later insert comes first.
    assert_eq!(amounts, vec![dec!(5.00), dec!(12.00), dec!(8.00), dec!(1000.00)]);
    assert!(all.data.iter().all(|t| !t.account_name.is_empty()));
    assert!(all.data.iter().all(|t| t.category_icon == "tag"));

    let expenses = ledger
        .transactions
        .list_transactions(
            ledger.owner,
            TransactionFilter {
                polarity: Some(Polarity::Expense),
                date_from: chrono::NaiveDate::from_ymd_opt(2024, 5, 3),
                ..Default::default()
            },
            PageRequest {
                limit: 1,
                offset: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(expenses.meta.total, 2);
    assert_eq!(expenses.data.len(), 1);
    assert_eq!(expenses.data[0].transaction.amount, dec!(12.00));

    let other = Ledger::new(ledger.db.clone());
    let empty = other
        .transactions
        .list_transactions(other.owner, TransactionFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert!(empty.data.is_empty());
    assert_eq!(empty.meta.total, 0);
}
