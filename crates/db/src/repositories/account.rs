//! Account repository: accounts, their balances and default selection.
//!
//! Balances change in two ways only: through [`AccountRepository::apply_balance_delta`]
//! inside a transaction-engine unit of work, or through a direct edit in
//! [`AccountRepository::update_account`].

use std::sync::Arc;

use chrono::Utc;
use fintrack_core::audit::{AuditEntry, AuditSink, ChangeSet, EntityKind};
use fintrack_core::ledger::validation::{validate_balance, validate_name};
use fintrack_core::ledger::{BalanceDelta, LedgerError, Polarity};
use fintrack_core::stats::AccountStats;
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::entities::{accounts, sea_orm_active_enums::CategoryType, transactions};
use crate::error::StoreError;

/// Name of the account created when a user is provisioned.
pub const DEFAULT_ACCOUNT_NAME: &str = "Main Account";

/// Input for creating an account.
#[derive(Debug, Clone, Default)]
pub struct CreateAccountInput {
    /// Display name.
    pub name: String,
    /// Opening balance, zero when absent.
    pub balance: Option<Decimal>,
    /// Make this the default account.
    pub is_default: bool,
}

/// Input for editing an account directly.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// New balance (manual correction).
    pub balance: Option<Decimal>,
}

/// What provisioning created for a user.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    /// The default account, when one had to be created.
    pub account: Option<accounts::Model>,
    /// Number of system categories copied into the user's own.
    pub categories_cloned: u64,
}

const CLONE_SYSTEM_CATEGORIES_SQL: &str = r"
INSERT INTO categories (id, user_id, name, type, icon, color, is_system)
SELECT gen_random_uuid(), $1, s.name, s.type, s.icon, s.color, false
FROM categories s
WHERE s.is_system
  AND NOT EXISTS (
      SELECT 1 FROM categories c
      WHERE c.user_id = $1 AND c.type = s.type AND c.name = s.name
  )
";

const LOCK_OWNER_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext($1::text))";

fn snapshot(account: &accounts::Model) -> Value {
    json!({
        "id": account.id,
        "name": account.name,
        "balance": account.balance,
        "is_default": account.is_default,
    })
}

/// Account repository.
#[derive(Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Lists the owner's accounts, default first, then oldest first.
    pub async fn list_accounts(&self, owner: UserId) -> Result<Vec<accounts::Model>, LedgerError> {
        let accounts = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .order_by_desc(accounts::Column::IsDefault)
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(StoreError::from)?;
        Ok(accounts)
    }

    /// Gets one of the owner's accounts.
    pub async fn get_account(&self, owner: UserId, id: AccountId) -> Result<accounts::Model, LedgerError> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?
            .ok_or(LedgerError::AccountNotFound(id.into_inner()))?;
        Ok(account)
    }

    /// Creates an account.
    ///
    /// The user's first account is always the default. Making a new account
    /// default clears the flag on the others in the same unit of work.
    pub async fn create_account(
        &self,
        owner: UserId,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, LedgerError> {
        let name = validate_name(&input.name)?;
        let balance = validate_balance(input.balance.unwrap_or_default())?;

        let account = self.insert_account(owner, name, balance, input.is_default).await?;

        tracing::info!(
            user_id = %owner,
            account_id = %account.id,
            is_default = account.is_default,
            "Account created"
        );
        self.audit.submit(AuditEntry::created(
            owner,
            EntityKind::Account,
            account.id,
            snapshot(&account),
        ));
        Ok(account)
    }

    async fn insert_account(
        &self,
        owner: UserId,
        name: String,
        balance: Decimal,
        is_default: bool,
    ) -> Result<accounts::Model, StoreError> {
        let txn = self.db.begin().await?;
        Self::lock_owner(&txn, owner).await?;

        let existing = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .count(&txn)
            .await?;
        let is_default = is_default || existing == 0;

        if is_default {
            Self::clear_default(&txn, owner).await?;
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            user_id: Set(owner.into_inner()),
            name: Set(name),
            balance: Set(balance),
            is_default: Set(is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(account)
    }

    /// Edits name and/or balance. Values equal to the stored ones are ignored.
    ///
    /// A balance edit bypasses the transaction engine; it is audited under
    /// the `balance` key.
    pub async fn update_account(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, LedgerError> {
        let name = input.name.as_deref().map(validate_name).transpose()?;
        let balance = input.balance.map(validate_balance).transpose()?;

        let (account, changes) = self.apply_account_update(owner, id, name, balance).await?;

        if let Some(entry) = AuditEntry::updated(owner, EntityKind::Account, account.id, &changes) {
            tracing::info!(
                user_id = %owner,
                account_id = %account.id,
                changed = changes.len(),
                "Account updated"
            );
            self.audit.submit(entry);
        }
        Ok(account)
    }

    async fn apply_account_update(
        &self,
        owner: UserId,
        id: AccountId,
        name: Option<String>,
        balance: Option<Decimal>,
    ) -> Result<(accounts::Model, ChangeSet), StoreError> {
        let txn = self.db.begin().await?;
        let current = Self::lock_owned(&txn, owner, id).await?;

        let mut changes = ChangeSet::new();
        let mut active: accounts::ActiveModel = current.clone().into();
        if let Some(name) = name {
            if changes.record("name", current.name.as_str(), name.as_str()) {
                active.name = Set(name);
            }
        }
        if let Some(balance) = balance {
            if changes.record("balance", &current.balance, &balance) {
                active.balance = Set(balance);
            }
        }

        if changes.is_empty() {
            return Ok((current, changes));
        }

        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok((updated, changes))
    }

    /// Deletes an account.
    ///
    /// Refuses the owner's only account and any account that still holds
    /// transactions. If the default account is deleted, the oldest remaining
    /// account becomes default.
    pub async fn delete_account(&self, owner: UserId, id: AccountId) -> Result<(), LedgerError> {
        let deleted = self.remove_account(owner, id).await?;

        tracing::info!(user_id = %owner, account_id = %deleted.id, "Account deleted");
        self.audit.submit(AuditEntry::deleted(
            owner,
            EntityKind::Account,
            deleted.id,
            snapshot(&deleted),
        ));
        Ok(())
    }

    async fn remove_account(&self, owner: UserId, id: AccountId) -> Result<accounts::Model, StoreError> {
        let txn = self.db.begin().await?;
        Self::lock_owner(&txn, owner).await?;
        let account = Self::lock_owned(&txn, owner, id).await?;

        let owned = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .count(&txn)
            .await?;
        if owned <= 1 {
            return Err(LedgerError::SoleAccount.into());
        }

        let referencing = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account.id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            return Err(LedgerError::AccountHasTransactions(referencing).into());
        }

        accounts::Entity::delete_by_id(account.id).exec(&txn).await?;

        if account.is_default {
            let successor = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(owner.into_inner()))
                .order_by_asc(accounts::Column::CreatedAt)
                .order_by_asc(accounts::Column::Id)
                .one(&txn)
                .await?;
            if let Some(successor) = successor {
                Self::mark_default(&txn, successor.id).await?;
            }
        }

        txn.commit().await?;
        Ok(account)
    }

    /// Makes `id` the owner's only default account.
    pub async fn set_default_account(
        &self,
        owner: UserId,
        id: AccountId,
    ) -> Result<accounts::Model, LedgerError> {
        let (account, was_default) = self.switch_default(owner, id).await?;

        if !was_default {
            let mut changes = ChangeSet::new();
            changes.record("is_default", &false, &true);
            tracing::info!(user_id = %owner, account_id = %account.id, "Default account changed");
            if let Some(entry) = AuditEntry::updated(owner, EntityKind::Account, account.id, &changes) {
                self.audit.submit(entry);
            }
        }
        Ok(account)
    }

    async fn switch_default(&self, owner: UserId, id: AccountId) -> Result<(accounts::Model, bool), StoreError> {
        let txn = self.db.begin().await?;
        Self::lock_owner(&txn, owner).await?;
        let account = Self::lock_owned(&txn, owner, id).await?;
        if account.is_default {
            return Ok((account, true));
        }

        Self::clear_default(&txn, owner).await?;
        Self::mark_default(&txn, account.id).await?;
        let updated = accounts::Entity::find_by_id(account.id)
            .one(&txn)
            .await?
            .ok_or(LedgerError::AccountNotFound(account.id))?;

        txn.commit().await?;
        Ok((updated, false))
    }

    /// Balance and income/expense totals of one account.
    pub async fn account_stats(&self, owner: UserId, id: AccountId) -> Result<AccountStats, LedgerError> {
        let account = self.get_account(owner, id).await?;

        let rows: Vec<(CategoryType, Decimal)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::Amount)
            .filter(transactions::Column::AccountId.eq(account.id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(StoreError::from)?;

        let mut stats = AccountStats {
            account_id: id,
            balance: account.balance,
            total_income: Decimal::ZERO,
            total_expense: Decimal::ZERO,
            transactions_count: rows.len() as u64,
        };
        for (kind, amount) in rows {
            match Polarity::from(kind) {
                Polarity::Income => stats.total_income += amount,
                Polarity::Expense => stats.total_expense += amount,
            }
        }
        Ok(stats)
    }

    /// Onboards a user: a default "Main Account" when they have no account,
    /// plus their own copy of every system category. Safe to call repeatedly.
    pub async fn provision_user(&self, owner: UserId) -> Result<ProvisionOutcome, LedgerError> {
        let outcome = self.provision(owner).await?;

        if let Some(account) = &outcome.account {
            self.audit.submit(AuditEntry::created(
                owner,
                EntityKind::Account,
                account.id,
                snapshot(account),
            ));
        }
        tracing::info!(
            user_id = %owner,
            account_created = outcome.account.is_some(),
            categories_cloned = outcome.categories_cloned,
            "User provisioned"
        );
        Ok(outcome)
    }

    async fn provision(&self, owner: UserId) -> Result<ProvisionOutcome, StoreError> {
        let txn = self.db.begin().await?;
        Self::lock_owner(&txn, owner).await?;

        let existing = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .count(&txn)
            .await?;

        let account = if existing == 0 {
            let now = Utc::now().into();
            let model = accounts::ActiveModel {
                id: Set(AccountId::new().into_inner()),
                user_id: Set(owner.into_inner()),
                name: Set(DEFAULT_ACCOUNT_NAME.to_string()),
                balance: Set(Decimal::ZERO),
                is_default: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            Some(model)
        } else {
            None
        };

        let cloned = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                CLONE_SYSTEM_CATEGORIES_SQL,
                [owner.into_inner().into()],
            ))
            .await?;

        txn.commit().await?;
        Ok(ProvisionOutcome {
            account,
            categories_cloned: cloned.rows_affected(),
        })
    }

    /// Serialises changes to the owner's set of accounts until `txn` ends.
    ///
    /// Held by every path that adds or removes accounts or moves the default
    /// flag, so counts and default checks read a stable set. The transaction
    /// engine does not take it; it only locks account rows.
    async fn lock_owner(txn: &DatabaseTransaction, owner: UserId) -> Result<(), StoreError> {
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            LOCK_OWNER_SQL,
            [owner.into_inner().into()],
        ))
        .await?;
        Ok(())
    }

    /// Locks one of the owner's account rows for the rest of `txn`.
    pub(crate) async fn lock_owned(
        txn: &DatabaseTransaction,
        owner: UserId,
        id: AccountId,
    ) -> Result<accounts::Model, StoreError> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or(LedgerError::AccountNotFound(id.into_inner()))?;
        Ok(account)
    }

    /// Adds `delta.amount` to the account balance in one statement.
    ///
    /// Only callable with an open unit of work; the caller is expected to
    /// hold the row lock already.
    pub(crate) async fn apply_balance_delta(
        txn: &DatabaseTransaction,
        delta: BalanceDelta,
    ) -> Result<(), StoreError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta.amount),
            )
            .col_expr(
                accounts::Column::UpdatedAt,
                Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())),
            )
            .filter(accounts::Column::Id.eq(delta.account_id.into_inner()))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(delta.account_id.into_inner()).into());
        }
        Ok(())
    }

    async fn clear_default(txn: &DatabaseTransaction, owner: UserId) -> Result<(), StoreError> {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::IsDefault, Expr::value(false))
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .filter(accounts::Column::IsDefault.eq(true))
            .exec(txn)
            .await?;
        Ok(())
    }

    async fn mark_default(txn: &DatabaseTransaction, id: Uuid) -> Result<(), StoreError> {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::IsDefault, Expr::value(true))
            .filter(accounts::Column::Id.eq(id))
            .exec(txn)
            .await?;
        Ok(())
    }
}
