//! Transaction repository: the transaction engine.
//!
//! Every mutation runs as one database transaction that locks the rows it
//! touches, writes the transaction row and adjusts account balances with an
//! atomic increment. The pure planning lives in
//! [`fintrack_core::ledger::LedgerService`]; this module executes the plan.
//!
//! The unit of work runs under a deadline. If the deadline elapses before
//! commit, the open database transaction is dropped and rolled back.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fintrack_core::audit::{AuditEntry, AuditSink, ChangeSet, EntityKind};
use fintrack_core::ledger::{
    CreateTransactionInput, LedgerError, LedgerEvent, LedgerObserver, LedgerOperation,
    LedgerService, NewTransaction, Outcome, TransactionFilter, TransactionPatch, TransactionRecord,
    UpdateTransactionInput,
};
use fintrack_shared::types::{
    AccountId, CategoryId, PageRequest, PageResponse, TransactionId, UserId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::account::AccountRepository;
use super::category::CategoryRepository;
use crate::entities::{accounts, categories, sea_orm_active_enums::CategoryType, transactions};
use crate::error::StoreError;

/// Deadline applied when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(5000);

/// A transaction with the display fields of its account and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithNames {
    /// The transaction row.
    pub transaction: transactions::Model,
    /// Account name.
    pub account_name: String,
    /// Category name.
    pub category_name: String,
    /// Category icon.
    pub category_icon: String,
    /// Category color.
    pub category_color: String,
}

/// Converts a stored row to its domain form.
pub(crate) fn to_record(model: &transactions::Model) -> TransactionRecord {
    TransactionRecord {
        id: TransactionId::from_uuid(model.id),
        owner: UserId::from_uuid(model.user_id),
        account_id: AccountId::from_uuid(model.account_id),
        category_id: CategoryId::from_uuid(model.category_id),
        polarity: model.transaction_type.into(),
        amount: model.amount,
        description: model.description.clone(),
        value_date: model.value_date,
    }
}

/// Transaction repository.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
    observer: Arc<dyn LedgerObserver>,
    deadline: Duration,
}

impl TransactionRepository {
    /// Creates a new transaction repository with the default deadline.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        audit: Arc<dyn AuditSink>,
        observer: Arc<dyn LedgerObserver>,
    ) -> Self {
        Self {
            db,
            audit,
            observer,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Overrides the unit-of-work deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Records a transaction and applies its effect to the account balance.
    ///
    /// The polarity is read from the category inside the unit of work.
    /// Resubmitting the same input records a second transaction.
    pub async fn create_transaction(
        &self,
        owner: UserId,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, LedgerError> {
        let result = self.create_inner(owner, input).await;
        let id = result.as_ref().ok().map(|m| TransactionId::from_uuid(m.id));
        self.observe(LedgerOperation::CreateTransaction, owner, id, &result);
        result
    }

    async fn create_inner(
        &self,
        owner: UserId,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, LedgerError> {
        let new = input.validate(Utc::now().date_naive())?;

        let (txn, created) = self.within_deadline(self.create_unit(owner, new)).await?;
        txn.commit().await.map_err(StoreError::from)?;

        let record = to_record(&created);
        self.audit.submit(AuditEntry::created(
            owner,
            EntityKind::Transaction,
            created.id,
            record.snapshot(),
        ));
        Ok(created)
    }

    async fn create_unit(
        &self,
        owner: UserId,
        new: NewTransaction,
    ) -> Result<(DatabaseTransaction, transactions::Model), StoreError> {
        let txn = self.db.begin().await?;

        let polarity = CategoryRepository::resolve_category_type(&txn, owner, new.category_id).await?;
        AccountRepository::lock_owned(&txn, owner, new.account_id).await?;

        let record = new.into_record(TransactionId::new(), owner, polarity);
        let now = Utc::now().into();
        let created = transactions::ActiveModel {
            id: Set(record.id.into_inner()),
            user_id: Set(owner.into_inner()),
            account_id: Set(record.account_id.into_inner()),
            category_id: Set(record.category_id.into_inner()),
            transaction_type: Set(CategoryType::from(record.polarity)),
            amount: Set(record.amount),
            description: Set(record.description.clone()),
            value_date: Set(record.value_date),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        AccountRepository::apply_balance_delta(&txn, record.balance_effect()).await?;

        Ok((txn, created))
    }

    /// Applies a partial update.
    ///
    /// The old effect is reversed on the old account and the new effect is
    /// applied to the (possibly different) new account in the same unit of
    /// work. An update that changes nothing writes nothing and is not audited.
    pub async fn update_transaction(
        &self,
        owner: UserId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, LedgerError> {
        let result = self.update_inner(owner, id, input).await;
        self.observe(LedgerOperation::UpdateTransaction, owner, Some(id), &result);
        result
    }

    async fn update_inner(
        &self,
        owner: UserId,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, LedgerError> {
        let patch = input.validate()?;

        let (txn, (updated, changes)) = self.within_deadline(self.update_unit(owner, id, patch)).await?;
        txn.commit().await.map_err(StoreError::from)?;

        if let Some(entry) = AuditEntry::updated(owner, EntityKind::Transaction, updated.id, &changes) {
            self.audit.submit(entry);
        }
        Ok(updated)
    }

    async fn update_unit(
        &self,
        owner: UserId,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<(DatabaseTransaction, (transactions::Model, ChangeSet)), StoreError> {
        let txn = self.db.begin().await?;
        let current = Self::lock_owned(&txn, owner, id).await?;
        let record = to_record(&current);

        let resolved = match LedgerService::category_change(&record, &patch) {
            Some(category_id) => {
                Some(CategoryRepository::resolve_category_type(&txn, owner, category_id).await?)
            }
            None => None,
        };

        let plan = LedgerService::plan_update(&record, patch, resolved);
        if plan.is_noop() {
            return Ok((txn, (current, plan.changes)));
        }

        let touches_balance = plan.touches_balance();
        if touches_balance {
            for account_id in plan.lock_order() {
                AccountRepository::lock_owned(&txn, owner, account_id).await?;
            }
            AccountRepository::apply_balance_delta(&txn, plan.reversal).await?;
        }

        let merged = &plan.updated;
        let mut active: transactions::ActiveModel = current.into();
        active.account_id = Set(merged.account_id.into_inner());
        active.category_id = Set(merged.category_id.into_inner());
        active.transaction_type = Set(CategoryType::from(merged.polarity));
        active.amount = Set(merged.amount);
        active.description = Set(merged.description.clone());
        active.value_date = Set(merged.value_date);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        if touches_balance {
            AccountRepository::apply_balance_delta(&txn, plan.effect).await?;
        }

        Ok((txn, (updated, plan.changes)))
    }

    /// Removes a transaction and reverses its effect on the account balance.
    pub async fn delete_transaction(&self, owner: UserId, id: TransactionId) -> Result<(), LedgerError> {
        let result = self.delete_inner(owner, id).await;
        self.observe(LedgerOperation::DeleteTransaction, owner, Some(id), &result);
        result
    }

    async fn delete_inner(&self, owner: UserId, id: TransactionId) -> Result<(), LedgerError> {
        let (txn, record) = self.within_deadline(self.delete_unit(owner, id)).await?;
        txn.commit().await.map_err(StoreError::from)?;

        self.audit.submit(AuditEntry::deleted(
            owner,
            EntityKind::Transaction,
            record.id.into_inner(),
            record.snapshot(),
        ));
        Ok(())
    }

    async fn delete_unit(
        &self,
        owner: UserId,
        id: TransactionId,
    ) -> Result<(DatabaseTransaction, TransactionRecord), StoreError> {
        let txn = self.db.begin().await?;
        let current = Self::lock_owned(&txn, owner, id).await?;
        let record = to_record(&current);

        AccountRepository::lock_owned(&txn, owner, record.account_id).await?;
        transactions::Entity::delete_by_id(current.id).exec(&txn).await?;
        AccountRepository::apply_balance_delta(&txn, record.reversal()).await?;

        Ok((txn, record))
    }

    /// Gets one of the owner's transactions.
    pub async fn get_transaction(
        &self,
        owner: UserId,
        id: TransactionId,
    ) -> Result<transactions::Model, LedgerError> {
        let transaction = transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))?;
        Ok(transaction)
    }

    /// Lists the owner's transactions, newest value date first.
    pub async fn list_transactions(
        &self,
        owner: UserId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionWithNames>, LedgerError> {
        self.list_inner(owner, filter, page)
            .await
            .map_err(LedgerError::from)
    }

    async fn list_inner(
        &self,
        owner: UserId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionWithNames>, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(owner.into_inner()));

        if let Some(account_id) = filter.account_id {
            query = query.filter(transactions::Column::AccountId.eq(account_id.into_inner()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.into_inner()));
        }
        if let Some(polarity) = filter.polarity {
            query = query.filter(transactions::Column::TransactionType.eq(CategoryType::from(polarity)));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::ValueDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::ValueDate.lte(date_to));
        }

        let total = query.clone().count(&self.db).await?;

        let rows = query
            .order_by_desc(transactions::Column::ValueDate)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await?;

        if rows.is_empty() {
            return Ok(PageResponse::new(Vec::new(), page, total));
        }

        let account_ids: Vec<Uuid> = rows.iter().map(|r| r.account_id).collect();
        let category_ids: Vec<Uuid> = rows.iter().map(|r| r.category_id).collect();

        let account_names: HashMap<Uuid, String> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(account_ids))
            .select_only()
            .column(accounts::Column::Id)
            .column(accounts::Column::Name)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let categories: HashMap<Uuid, categories::Model> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let data = rows
            .into_iter()
            .map(|transaction| {
                let account_name = account_names
                    .get(&transaction.account_id)
                    .cloned()
                    .unwrap_or_default();
                let (category_name, category_icon, category_color) = categories
                    .get(&transaction.category_id)
                    .map(|c| (c.name.clone(), c.icon.clone(), c.color.clone()))
                    .unwrap_or_default();
                TransactionWithNames {
                    transaction,
                    account_name,
                    category_name,
                    category_icon,
                    category_color,
                }
            })
            .collect();

        Ok(PageResponse::new(data, page, total))
    }

    /// Runs the part of a unit of work that precedes commit under the deadline.
    ///
    /// On timeout the future, and the database transaction it owns, is
    /// dropped, which rolls the transaction back.
    async fn within_deadline<T>(
        &self,
        unit: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.deadline, unit).await {
            Ok(result) => result.map_err(LedgerError::from),
            Err(_) => Err(LedgerError::DeadlineExceeded),
        }
    }

    fn observe<T>(
        &self,
        operation: LedgerOperation,
        owner: UserId,
        transaction_id: Option<TransactionId>,
        result: &Result<T, LedgerError>,
    ) {
        let outcome = match result {
            Ok(_) => Outcome::Committed,
            Err(e) => Outcome::Failed(e.kind()),
        };
        self.observer.observe(&LedgerEvent {
            operation,
            owner,
            transaction_id,
            outcome,
        });
    }

    /// Locks one of the owner's transaction rows for the rest of `txn`.
    async fn lock_owned(
        txn: &DatabaseTransaction,
        owner: UserId,
        id: TransactionId,
    ) -> Result<transactions::Model, StoreError> {
        let transaction = transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fintrack_core::ledger::Polarity;
    use rust_decimal_macros::dec;

    fn model(transaction_type: CategoryType) -> transactions::Model {
        let now = Utc::now().into();
        transactions::Model {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            account_id: Uuid::now_v7(),
            category_id: Uuid::now_v7(),
            transaction_type,
            amount: dec!(42.10),
            description: "Coffee beans".to_string(),
            value_date: NaiveDate::from_ymd_opt(2024, 4, 12).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_record_keeps_stored_polarity() {
        let row = model(CategoryType::Expense);
        let record = to_record(&row);

        assert_eq!(record.id.into_inner(), row.id);
        assert_eq!(record.polarity, Polarity::Expense);
        assert_eq!(record.balance_effect().amount, dec!(-42.10));
        assert_eq!(record.reversal().amount, dec!(42.10));
    }

    #[tokio::test]
    async fn test_within_deadline_times_out() {
        let repo = TransactionRepository::new(
            DatabaseConnection::Disconnected,
            Arc::new(fintrack_core::audit::NoopAuditSink),
            Arc::new(fintrack_core::ledger::TracingObserver),
        )
        .with_deadline(Duration::from_millis(10));

        let result: Result<(), LedgerError> = repo
            .within_deadline(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(LedgerError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_validation_fails_before_storage_and_is_observed() {
        let observer = Arc::new(fintrack_core::ledger::MemoryObserver::new());
        let repo = TransactionRepository::new(
            DatabaseConnection::Disconnected,
            Arc::new(fintrack_core::audit::NoopAuditSink),
            observer.clone(),
        );
        let owner = UserId::new();

        let result = repo
            .create_transaction(
                owner,
                CreateTransactionInput {
                    account_id: AccountId::new(),
                    category_id: CategoryId::new(),
                    amount: dec!(-5),
                    description: String::new(),
                    value_date: None,
                },
            )
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));

        let events = observer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].operation, LedgerOperation::CreateTransaction);
        assert_eq!(events[0].owner, owner);
        assert_eq!(events[0].transaction_id, None);
        assert_eq!(
            events[0].outcome,
            Outcome::Failed(fintrack_core::ledger::ErrorKind::InvalidArgument)
        );
    }
}
