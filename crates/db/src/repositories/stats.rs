//! Stats repository: loads committed ledger rows for the projections in
//! [`fintrack_core::stats`].

use std::collections::HashMap;

use chrono::{Days, Months, NaiveDate, Utc};
use fintrack_core::ledger::Polarity;
use fintrack_core::stats::{
    AccountSnapshot, CategoryActivity, CategoryBreakdown, CategoryTotal, DailyBalance, Forecast,
    Insight, InsightInputs, LedgerRow, MonthlyStats, Overview, OverviewPeriod, Period,
    PeriodTotals, StatsService, Summary, Trends, FORECAST_LOOKBACK_MONTHS,
};
use fintrack_shared::types::{AccountId, CategoryId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use uuid::Uuid;

use crate::entities::{accounts, categories, sea_orm_active_enums::CategoryType, transactions};

const MONTHLY_TOTALS_SQL: &str = r"
SELECT date_trunc('month', date)::date AS month,
       COALESCE(SUM(amount) FILTER (WHERE type = 'income'), 0) AS income,
       COALESCE(SUM(amount) FILTER (WHERE type = 'expense'), 0) AS expense
FROM transactions
WHERE user_id = $1
GROUP BY 1
ORDER BY 1 DESC
LIMIT $2
";

#[derive(Debug, FromQueryResult)]
struct MonthTotals {
    income: Decimal,
    expense: Decimal,
}

/// Stats repository.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db: DatabaseConnection,
}

impl StatsRepository {
    /// Creates a new stats repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Totals over every account and transaction the owner has.
    pub async fn summary(&self, owner: UserId) -> Result<Summary, DbErr> {
        let (total_balance, accounts_count) = self.balance_total(owner).await?;

        let totals: Vec<(CategoryType, Option<Decimal>, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionType)
            .column_as(transactions::Column::Amount.sum(), "total")
            .column_as(transactions::Column::Id.count(), "count")
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .group_by(transactions::Column::TransactionType)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut summary = Summary {
            total_balance,
            accounts_count,
            total_income: Decimal::ZERO,
            total_expense: Decimal::ZERO,
            transactions_count: 0,
        };
        for (kind, total, count) in totals {
            let total = total.unwrap_or_default();
            match Polarity::from(kind) {
                Polarity::Income => summary.total_income += total,
                Polarity::Expense => summary.total_expense += total,
            }
            summary.transactions_count += u64::try_from(count).unwrap_or_default();
        }
        Ok(summary)
    }

    /// Per-month totals for the last `months` calendar months, newest first.
    pub async fn monthly(&self, owner: UserId, months: u32) -> Result<Vec<MonthlyStats>, DbErr> {
        let today = Utc::now().date_naive();
        let start = StatsService::monthly_window_start(today, months);
        let rows = self.rows_since(owner, start).await?;
        Ok(StatsService::monthly(&rows, today, months))
    }

    /// Daily running total balance over the last `days` days.
    pub async fn balance_history(&self, owner: UserId, days: u32) -> Result<Vec<DailyBalance>, DbErr> {
        let today = Utc::now().date_naive();
        let start = StatsService::daily_window_start(today, days);
        let (total_balance, _) = self.balance_total(owner).await?;
        let rows = self.rows_since(owner, start).await?;
        Ok(StatsService::balance_history(total_balance, &rows, today, days))
    }

    /// Amount per category for one polarity over `period`.
    pub async fn category_breakdown(
        &self,
        owner: UserId,
        polarity: Polarity,
        period: Period,
    ) -> Result<CategoryBreakdown, DbErr> {
        let start = period.start(Utc::now().date_naive());

        let sums: Vec<(Uuid, Option<Decimal>, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::CategoryId)
            .column_as(transactions::Column::Amount.sum(), "total")
            .column_as(transactions::Column::Id.count(), "count")
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .filter(transactions::Column::TransactionType.eq(CategoryType::from(polarity)))
            .filter(transactions::Column::ValueDate.gte(start))
            .group_by(transactions::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;

        if sums.is_empty() {
            return Ok(StatsService::category_breakdown(Vec::new(), polarity, period));
        }

        let ids: Vec<Uuid> = sums.iter().map(|(id, _, _)| *id).collect();
        let categories: HashMap<Uuid, categories::Model> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let totals = sums
            .into_iter()
            .filter_map(|(id, total, count)| {
                let category = categories.get(&id)?;
                Some(CategoryTotal {
                    name: category.name.clone(),
                    color: category.color.clone(),
                    icon: category.icon.clone(),
                    amount: total.unwrap_or_default(),
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect();

        Ok(StatsService::category_breakdown(totals, polarity, period))
    }

    /// Daily income/expense series over the last `days` days.
    pub async fn trends(&self, owner: UserId, days: u32) -> Result<Trends, DbErr> {
        let today = Utc::now().date_naive();
        let start = StatsService::daily_window_start(today, days);
        let rows = self.rows_since(owner, start).await?;
        Ok(StatsService::trends(&rows, today, days))
    }

    /// Projection from the most recent months that have transactions.
    pub async fn forecast(&self, owner: UserId, months: u32) -> Result<Forecast, DbErr> {
        let history: Vec<(Decimal, Decimal)> = MonthTotals::find_by_statement(
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                MONTHLY_TOTALS_SQL,
                [
                    owner.into_inner().into(),
                    i64::try_from(FORECAST_LOOKBACK_MONTHS).unwrap_or(6).into(),
                ],
            ),
        )
        .all(&self.db)
        .await?
        .into_iter()
        .map(|m| (m.income, m.expense))
        .collect();

        Ok(StatsService::forecast(&history, months))
    }

    /// Totals, top categories, account split and month-over-month change
    /// for `period`.
    pub async fn overview(&self, owner: UserId, period: OverviewPeriod) -> Result<Overview, DbErr> {
        let today = Utc::now().date_naive();
        let start = period.start(today);

        let activity = self.category_activity(owner, start, today).await?;
        let accounts: Vec<(Uuid, String, Decimal)> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Id)
            .column(accounts::Column::Name)
            .column(accounts::Column::Balance)
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .order_by_desc(accounts::Column::IsDefault)
            .order_by_desc(accounts::Column::Balance)
            .into_tuple()
            .all(&self.db)
            .await?;
        let accounts = accounts
            .into_iter()
            .map(|(id, name, balance)| AccountSnapshot {
                account_id: AccountId::from_uuid(id),
                name,
                balance,
            })
            .collect();
        let previous = self.previous_month_totals(owner, start).await?;

        Ok(StatsService::overview(period, activity, accounts, previous))
    }

    /// Observations about the current month.
    pub async fn insights(&self, owner: UserId) -> Result<Vec<Insight>, DbErr> {
        let today = Utc::now().date_naive();
        let month_start = StatsService::month_start(today);

        let top_expense = self
            .category_activity(owner, month_start, today)
            .await?
            .into_iter()
            .filter(|a| a.polarity == Polarity::Expense)
            .max_by(|a, b| a.amount.cmp(&b.amount))
            .map(|a| (a.name, a.amount));

        let inputs = InsightInputs {
            top_expense,
            this_month: self.period_totals(owner, month_start, today).await?,
            last_month: self.previous_month_totals(owner, month_start).await?,
        };
        Ok(StatsService::insights(today, &inputs))
    }

    /// Income and expense of the month ending the day before `start`.
    async fn previous_month_totals(&self, owner: UserId, start: NaiveDate) -> Result<PeriodTotals, DbErr> {
        let from = start.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN);
        let to = start.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN);
        self.period_totals(owner, from, to).await
    }

    async fn period_totals(
        &self,
        owner: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PeriodTotals, DbErr> {
        let sums: Vec<(CategoryType, Option<Decimal>)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::TransactionType)
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .filter(transactions::Column::ValueDate.between(from, to))
            .group_by(transactions::Column::TransactionType)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut totals = PeriodTotals::default();
        for (kind, total) in sums {
            match Polarity::from(kind) {
                Polarity::Income => totals.income += total.unwrap_or_default(),
                Polarity::Expense => totals.expense += total.unwrap_or_default(),
            }
        }
        Ok(totals)
    }

    /// Per-category sums over `from..=to`, split by the stored polarity.
    async fn category_activity(
        &self,
        owner: UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryActivity>, DbErr> {
        let sums: Vec<(Uuid, CategoryType, Option<Decimal>, i64)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::CategoryId)
            .column(transactions::Column::TransactionType)
            .column_as(transactions::Column::Amount.sum(), "total")
            .column_as(transactions::Column::Id.count(), "count")
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .filter(transactions::Column::ValueDate.between(from, to))
            .group_by(transactions::Column::CategoryId)
            .group_by(transactions::Column::TransactionType)
            .into_tuple()
            .all(&self.db)
            .await?;

        if sums.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = sums.iter().map(|(id, _, _, _)| *id).collect();
        let categories: HashMap<Uuid, categories::Model> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(sums
            .into_iter()
            .filter_map(|(id, kind, total, count)| {
                let category = categories.get(&id)?;
                Some(CategoryActivity {
                    category_id: CategoryId::from_uuid(id),
                    name: category.name.clone(),
                    icon: category.icon.clone(),
                    color: category.color.clone(),
                    polarity: kind.into(),
                    amount: total.unwrap_or_default(),
                    count: u64::try_from(count).unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn balance_total(&self, owner: UserId) -> Result<(Decimal, u64), DbErr> {
        let balances: Vec<Decimal> = accounts::Entity::find()
            .select_only()
            .column(accounts::Column::Balance)
            .filter(accounts::Column::UserId.eq(owner.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await?;
        let count = balances.len() as u64;
        Ok((balances.into_iter().sum(), count))
    }

    async fn rows_since(&self, owner: UserId, start: NaiveDate) -> Result<Vec<LedgerRow>, DbErr> {
        let rows: Vec<(NaiveDate, CategoryType, Decimal)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::ValueDate)
            .column(transactions::Column::TransactionType)
            .column(transactions::Column::Amount)
            .filter(transactions::Column::UserId.eq(owner.into_inner()))
            .filter(transactions::Column::ValueDate.gte(start))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(value_date, kind, amount)| LedgerRow {
                value_date,
                polarity: kind.into(),
                amount,
            })
            .collect())
    }
}
