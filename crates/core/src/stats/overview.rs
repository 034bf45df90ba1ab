//! Period overview and rule-based insights.

use chrono::{Datelike, Days, Months, NaiveDate};
use fintrack_shared::types::{AccountId, CategoryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::service::StatsService;
use crate::ledger::Polarity;

/// Most categories an overview lists.
pub const TOP_CATEGORIES_LIMIT: usize = 10;

/// Window of an overview, always ending today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverviewPeriod {
    /// The last 7 days.
    Week,
    /// Since the first of the current month.
    #[default]
    Month,
    /// The last 3 months.
    Quarter,
    /// Since January 1st.
    Year,
}

impl OverviewPeriod {
    /// Parses a query value; anything unrecognized falls back to `Month`.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("week") => Self::Week,
            Some("quarter") => Self::Quarter,
            Some("year") => Self::Year,
            _ => Self::Month,
        }
    }

    /// First day of the window ending on `today`.
    #[must_use]
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Week => today.checked_sub_days(Days::new(7)),
            Self::Month => Some(StatsService::month_start(today)),
            Self::Quarter => today.checked_sub_months(Months::new(3)),
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

/// Income and expense over some date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    /// Income total.
    pub income: Decimal,
    /// Expense total.
    pub expense: Decimal,
}

impl PeriodTotals {
    /// `income - expense`.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }

    /// Share of income kept, in percent with two decimals; `None` without income.
    #[must_use]
    pub fn savings_rate(&self) -> Option<Decimal> {
        (self.income > Decimal::ZERO).then(|| StatsService::percentage(self.net(), self.income))
    }
}

/// Amount booked against one category, split by the polarity stored on the
/// transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryActivity {
    /// The category.
    pub category_id: CategoryId,
    /// Category name.
    pub name: String,
    /// Display icon.
    pub icon: String,
    /// Display color.
    pub color: String,
    /// Polarity of the transactions counted.
    pub polarity: Polarity,
    /// Sum of amounts.
    pub amount: Decimal,
    /// Number of transactions.
    pub count: u64,
}

/// An account and its current balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// The account.
    pub account_id: AccountId,
    /// Account name.
    pub name: String,
    /// Current balance.
    pub balance: Decimal,
}

/// One category in an overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStat {
    /// The category.
    pub category_id: CategoryId,
    /// Category name.
    pub category_name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub polarity: Polarity,
    /// Display icon.
    pub icon: String,
    /// Display color.
    pub color: String,
    /// Sum of amounts in the period.
    pub amount: Decimal,
    /// Number of transactions in the period.
    pub count: u64,
    /// Share of the period's income or expense, matching `polarity`.
    pub percentage: Decimal,
}

/// One account in an overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account.
    pub account_id: AccountId,
    /// Account name.
    pub account_name: String,
    /// Current balance.
    pub balance: Decimal,
    /// Share of the total balance; zero unless the total is positive.
    pub percentage: Decimal,
}

/// The period against the one before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Income difference.
    pub income_diff: Decimal,
    /// Expense difference.
    pub expense_diff: Decimal,
    /// Income change in percent; zero when the previous income was zero.
    pub income_change: Decimal,
    /// Expense change in percent; zero when the previous expense was zero.
    pub expense_change: Decimal,
}

/// Totals, top categories and account split for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    /// The window covered.
    pub period: OverviewPeriod,
    /// Income in the window.
    pub total_income: Decimal,
    /// Expense in the window.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub net_income: Decimal,
    /// Net income as a share of income; zero without income.
    pub savings_rate: Decimal,
    /// Busiest categories, largest amount first.
    pub top_categories: Vec<CategoryStat>,
    /// Against the month before the window start.
    pub month_comparison: Comparison,
    /// Every account, default first, then by balance.
    pub account_balances: Vec<AccountBalance>,
}

/// What an insight is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// The biggest expense category this month.
    ExpenseAnalysis,
    /// Spending this month against last month.
    TrendAnalysis,
    /// How much of this month's income is kept.
    SavingsAnalysis,
}

/// How urgently an insight deserves attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    /// Needs attention.
    High,
    /// Worth a look.
    Medium,
    /// Good news.
    Low,
}

/// A short observation about the owner's month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// What the insight is about.
    #[serde(rename = "type")]
    pub kind: InsightKind,
    /// Headline.
    pub title: String,
    /// One-sentence explanation.
    pub description: String,
    /// The number behind it (an amount or a percentage).
    pub value: Decimal,
    /// Urgency.
    pub priority: InsightPriority,
    /// Day the insight was computed.
    pub date: NaiveDate,
}

/// Figures the insight rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightInputs {
    /// Largest expense category this month, by name and amount.
    pub top_expense: Option<(String, Decimal)>,
    /// This month up to today.
    pub this_month: PeriodTotals,
    /// The whole previous month.
    pub last_month: PeriodTotals,
}

/// `(current - previous) / previous` in percent; zero when `previous` is not positive.
fn change(current: Decimal, previous: Decimal) -> Decimal {
    if previous > Decimal::ZERO {
        StatsService::percentage(current - previous, previous)
    } else {
        Decimal::ZERO
    }
}

impl StatsService {
    /// Builds an overview from the window's category activity, the current
    /// account balances and the totals of the month before the window.
    #[must_use]
    pub fn overview(
        period: OverviewPeriod,
        activity: Vec<CategoryActivity>,
        accounts: Vec<AccountSnapshot>,
        previous: PeriodTotals,
    ) -> Overview {
        let mut current = PeriodTotals::default();
        for a in &activity {
            match a.polarity {
                Polarity::Income => current.income += a.amount,
                Polarity::Expense => current.expense += a.amount,
            }
        }

        let mut activity: Vec<CategoryActivity> =
            activity.into_iter().filter(|a| a.count > 0).collect();
        activity.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        let top_categories = activity
            .into_iter()
            .take(TOP_CATEGORIES_LIMIT)
            .map(|a| {
                let of = match a.polarity {
                    Polarity::Income => current.income,
                    Polarity::Expense => current.expense,
                };
                CategoryStat {
                    percentage: Self::percentage(a.amount, of),
                    category_id: a.category_id,
                    category_name: a.name,
                    polarity: a.polarity,
                    icon: a.icon,
                    color: a.color,
                    amount: a.amount,
                    count: a.count,
                }
            })
            .collect();

        let total_balance: Decimal = accounts.iter().map(|a| a.balance).sum();
        let account_balances = accounts
            .into_iter()
            .map(|a| AccountBalance {
                percentage: if total_balance > Decimal::ZERO {
                    Self::percentage(a.balance, total_balance)
                } else {
                    Decimal::ZERO
                },
                account_id: a.account_id,
                account_name: a.name,
                balance: a.balance,
            })
            .collect();

        Overview {
            period,
            total_income: current.income,
            total_expense: current.expense,
            net_income: current.net(),
            savings_rate: current.savings_rate().unwrap_or_default(),
            top_categories,
            month_comparison: Comparison {
                income_diff: current.income - previous.income,
                expense_diff: current.expense - previous.expense,
                income_change: change(current.income, previous.income),
                expense_change: change(current.expense, previous.expense),
            },
            account_balances,
        }
    }

    /// Applies the insight rules; rules without enough data are skipped.
    #[must_use]
    pub fn insights(today: NaiveDate, inputs: &InsightInputs) -> Vec<Insight> {
        let mut insights = Vec::new();

        if let Some((name, amount)) = &inputs.top_expense {
            if *amount > Decimal::ZERO {
                insights.push(Insight {
                    kind: InsightKind::ExpenseAnalysis,
                    title: "Biggest expense".to_string(),
                    description: format!(
                        "'{name}' is your biggest expense this month ({amount})"
                    ),
                    value: *amount,
                    priority: InsightPriority::High,
                    date: today,
                });
            }
        }

        let (spent, spent_before) = (inputs.this_month.expense, inputs.last_month.expense);
        if spent_before > Decimal::ZERO {
            let delta = change(spent, spent_before);
            let shown = delta.abs().round_dp(0);
            let (description, priority) = if delta > Decimal::from(20) {
                (
                    format!("Spending is up {shown}% on last month"),
                    InsightPriority::High,
                )
            } else if delta < Decimal::from(-10) {
                (
                    format!("Nice! Spending is down {shown}% on last month"),
                    InsightPriority::Low,
                )
            } else {
                (
                    format!("Spending changed by {}% on last month", delta.round_dp(0)),
                    InsightPriority::Medium,
                )
            };
            insights.push(Insight {
                kind: InsightKind::TrendAnalysis,
                title: "Spending trend".to_string(),
                description,
                value: delta,
                priority,
                date: today,
            });
        }

        if let Some(rate) = inputs.this_month.savings_rate() {
            let shown = rate.round_dp(0);
            let (description, priority) = if rate > Decimal::from(30) {
                (format!("Great! You are saving {shown}% of your income"), InsightPriority::Low)
            } else if rate > Decimal::TEN {
                (format!("You are saving {shown}% of your income"), InsightPriority::Medium)
            } else if rate > Decimal::ZERO {
                (
                    format!("You are saving only {shown}% of your income. Try to raise it"),
                    InsightPriority::High,
                )
            } else {
                ("Your expenses exceed your income".to_string(), InsightPriority::High)
            };
            insights.push(Insight {
                kind: InsightKind::SavingsAnalysis,
                title: "Savings rate".to_string(),
                description,
                value: rate,
                priority,
                date: today,
            });
        }

        insights
    }
}
