//! Projection arithmetic.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;

use super::types::{
    CategoryBreakdown, CategoryShare, CategoryTotal, DailyBalance, Forecast, LedgerRow,
    MonthlyStats, Period, TrendPoint, Trends,
};
use crate::ledger::{Polarity, RunningBalance};

/// Most recent months of history a forecast looks at.
pub const FORECAST_LOOKBACK_MONTHS: usize = 6;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    income: Decimal,
    expense: Decimal,
    count: u64,
}

impl Totals {
    fn add(&mut self, row: &LedgerRow) {
        match row.polarity {
            Polarity::Income => self.income += row.amount,
            Polarity::Expense => self.expense += row.amount,
        }
        self.count += 1;
    }

    fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

/// Stats service for read-model projections.
///
/// Pure functions over rows already loaded from storage.
pub struct StatsService;

impl StatsService {
    /// First day of the month containing `date`.
    #[must_use]
    pub fn month_start(date: NaiveDate) -> NaiveDate {
        date.with_day(1).unwrap_or(date)
    }

    /// First day of the monthly window ending in the month of `today`.
    #[must_use]
    pub fn monthly_window_start(today: NaiveDate, months: u32) -> NaiveDate {
        Self::month_start(today)
            .checked_sub_months(Months::new(months.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// First day of a `days`-long window ending on `today`.
    #[must_use]
    pub fn daily_window_start(today: NaiveDate, days: u32) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Per-month totals from the start of the window, newest month first.
    ///
    /// Months without transactions are omitted.
    #[must_use]
    pub fn monthly(rows: &[LedgerRow], today: NaiveDate, months: u32) -> Vec<MonthlyStats> {
        let start = Self::monthly_window_start(today, months);
        let mut by_month: BTreeMap<(i32, u32), Totals> = BTreeMap::new();
        for row in rows.iter().filter(|r| r.value_date >= start) {
            by_month
                .entry((row.value_date.year(), row.value_date.month()))
                .or_default()
                .add(row);
        }

        by_month
            .into_iter()
            .rev()
            .map(|((year, month), totals)| MonthlyStats {
                month: format!("{year:04}-{month:02}"),
                year,
                income: totals.income,
                expense: totals.expense,
                balance: totals.net(),
                transactions: totals.count,
            })
            .collect()
    }

    /// Daily balance over the last `days` days, oldest first.
    ///
    /// `current_total` is the sum of account balances now, which already
    /// includes future-dated transactions. The opening balance is that total
    /// minus the net of the window itself, so the last point is always
    /// `current_total`.
    #[must_use]
    pub fn balance_history(
        current_total: Decimal,
        rows: &[LedgerRow],
        today: NaiveDate,
        days: u32,
    ) -> Vec<DailyBalance> {
        let start = Self::daily_window_start(today, days);
        let in_window: Decimal = rows
            .iter()
            .filter(|r| r.value_date >= start && r.value_date <= today)
            .map(LedgerRow::signed)
            .sum();

        let by_day = Self::daily_totals(rows, start, today);
        let mut running = RunningBalance::opening(current_total - in_window);

        start
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|date| {
                let totals = by_day.get(&date).copied().unwrap_or_default();
                running = running.apply(totals.net());
                DailyBalance {
                    date,
                    income: totals.income,
                    expense: totals.expense,
                    balance: running.current,
                }
            })
            .collect()
    }

    /// Shares of each category in `totals`, largest first.
    ///
    /// Categories with no transactions are dropped.
    #[must_use]
    pub fn category_breakdown(
        totals: Vec<CategoryTotal>,
        polarity: Polarity,
        period: Period,
    ) -> CategoryBreakdown {
        let mut totals: Vec<CategoryTotal> = totals.into_iter().filter(|t| t.count > 0).collect();
        totals.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        let total: Decimal = totals.iter().map(|t| t.amount).sum();

        let categories = totals
            .into_iter()
            .map(|t| CategoryShare {
                percentage: Self::percentage(t.amount, total),
                name: t.name,
                color: t.color,
                icon: t.icon,
                amount: t.amount,
                count: t.count,
            })
            .collect();

        CategoryBreakdown {
            categories,
            total,
            period,
            polarity,
        }
    }

    /// Daily income, expense and net over the last `days` days, with averages.
    #[must_use]
    pub fn trends(rows: &[LedgerRow], today: NaiveDate, days: u32) -> Trends {
        let start = Self::daily_window_start(today, days);
        let by_day = Self::daily_totals(rows, start, today);

        let points: Vec<TrendPoint> = start
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|date| {
                let totals = by_day.get(&date).copied().unwrap_or_default();
                TrendPoint {
                    date,
                    income: totals.income,
                    expense: totals.expense,
                    net: totals.net(),
                }
            })
            .collect();

        let average = |f: fn(&TrendPoint) -> Decimal| -> Decimal {
            if points.is_empty() {
                return Decimal::ZERO;
            }
            let sum: Decimal = points.iter().map(f).sum();
            (sum / Decimal::from(points.len())).round_dp(2)
        };

        Trends {
            days,
            average_income: average(|p| p.income),
            average_expense: average(|p| p.expense),
            average_net: average(|p| p.net),
            points,
        }
    }

    /// Projects `months` ahead from per-month `(income, expense)` history.
    ///
    /// Only the most recent months (newest first) up to
    /// [`FORECAST_LOOKBACK_MONTHS`] are used.
    #[must_use]
    pub fn forecast(history: &[(Decimal, Decimal)], months: u32) -> Forecast {
        let recent = &history[..history.len().min(FORECAST_LOOKBACK_MONTHS)];
        let based_on_months = recent.len();

        let (predicted_income, predicted_expense) = if recent.is_empty() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let n = Decimal::from(based_on_months);
            let horizon = Decimal::from(months);
            let income: Decimal = recent.iter().map(|(i, _)| *i).sum();
            let expense: Decimal = recent.iter().map(|(_, e)| *e).sum();
            (
                (income * horizon / n).round_dp(2),
                (expense * horizon / n).round_dp(2),
            )
        };

        Forecast {
            months,
            predicted_income,
            predicted_expense,
            predicted_balance: predicted_income - predicted_expense,
            confidence: Self::confidence(based_on_months),
            based_on_months,
        }
    }

    /// Forecast confidence for `months` of history.
    #[must_use]
    pub const fn confidence(months: usize) -> u8 {
        match months {
            6.. => 85,
            3..=5 => 65,
            1..=2 => 45,
            0 => 20,
        }
    }

    /// `part / total` in percent, two decimals; zero when `total` is zero.
    #[must_use]
    pub fn percentage(part: Decimal, total: Decimal) -> Decimal {
        if total.is_zero() {
            return Decimal::ZERO;
        }
        (part * Decimal::ONE_HUNDRED / total).round_dp(2)
    }

    fn daily_totals(
        rows: &[LedgerRow],
        start: NaiveDate,
        end: NaiveDate,
    ) -> BTreeMap<NaiveDate, Totals> {
        let mut by_day: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
        for row in rows
            .iter()
            .filter(|r| r.value_date >= start && r.value_date <= end)
        {
            by_day.entry(row.value_date).or_default().add(row);
        }
        by_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(value_date: NaiveDate, polarity: Polarity, amount: Decimal) -> LedgerRow {
        LedgerRow {
            value_date,
            polarity,
            amount,
        }
    }

    #[test]
    fn test_monthly_groups_newest_first() {
        let today = date(2024, 5, 15);
        let rows = [
            row(date(2024, 5, 1), Polarity::Income, dec!(1000.00)),
            row(date(2024, 5, 3), Polarity::Expense, dec!(200.00)),
            row(date(2024, 3, 10), Polarity::Expense, dec!(50.00)),
            // before the 3-month window
            row(date(2024, 2, 28), Polarity::Income, dec!(999.00)),
        ];

        let stats = StatsService::monthly(&rows, today, 3);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].month, "2024-05");
        assert_eq!(stats[0].income, dec!(1000.00));
        assert_eq!(stats[0].expense, dec!(200.00));
        assert_eq!(stats[0].balance, dec!(800.00));
        assert_eq!(stats[0].transactions, 2);
        assert_eq!(stats[1].month, "2024-03");
        assert_eq!(stats[1].balance, dec!(-50.00));
    }

    #[test]
    fn test_balance_history_ends_at_current_total() {
        let today = date(2024, 5, 10);
        let rows = [
            row(date(2024, 4, 1), Polarity::Income, dec!(500.00)),
            row(date(2024, 5, 9), Polarity::Expense, dec!(30.00)),
            row(date(2024, 5, 10), Polarity::Income, dec!(100.00)),
        ];
        // 500 - 30 + 100
        let history = StatsService::balance_history(dec!(570.00), &rows, today, 3);

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date, date(2024, 5, 8));
        assert_eq!(history[0].balance, dec!(500.00));
        assert_eq!(history[1].balance, dec!(470.00));
        assert_eq!(history[1].expense, dec!(30.00));
        assert_eq!(history[2].balance, dec!(570.00));
    }

    #[test]
    fn test_balance_history_ignores_future_dated_rows() {
        let today = date(2024, 5, 10);
        let rows = [
            row(date(2024, 5, 10), Polarity::Expense, dec!(20.00)),
            row(date(2024, 5, 20), Polarity::Income, dec!(300.00)),
        ];
        // 100 opening - 20 today + 300 booked ahead
        let history = StatsService::balance_history(dec!(380.00), &rows, today, 2);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].balance, dec!(400.00));
        assert_eq!(history[1].balance, dec!(380.00));
        assert_eq!(history[1].income, Decimal::ZERO);
    }

    #[test]
    fn test_category_breakdown_percentages() {
        let totals = vec![
            CategoryTotal {
                name: "Food".into(),
                color: "#f00".into(),
                icon: "food".into(),
                amount: dec!(25.00),
                count: 1,
            },
            CategoryTotal {
                name: "Rent".into(),
                color: "#0f0".into(),
                icon: "home".into(),
                amount: dec!(75.00),
                count: 2,
            },
            CategoryTotal {
                name: "Unused".into(),
                color: String::new(),
                icon: String::new(),
                amount: Decimal::ZERO,
                count: 0,
            },
        ];

        let breakdown = StatsService::category_breakdown(totals, Polarity::Expense, Period::Month);
        assert_eq!(breakdown.total, dec!(100.00));
        assert_eq!(breakdown.categories.len(), 2);
        assert_eq!(breakdown.categories[0].name, "Rent");
        assert_eq!(breakdown.categories[0].percentage, dec!(75));
        assert_eq!(breakdown.categories[1].percentage, dec!(25));
    }

    #[test]
    fn test_trends_fill_empty_days() {
        let today = date(2024, 1, 10);
        let rows = [
            row(date(2024, 1, 9), Polarity::Income, dec!(10.00)),
            row(date(2024, 1, 9), Polarity::Expense, dec!(4.00)),
        ];

        let trends = StatsService::trends(&rows, today, 4);
        assert_eq!(trends.points.len(), 4);
        assert_eq!(trends.points[2].net, dec!(6.00));
        assert_eq!(trends.points[3].income, Decimal::ZERO);
        assert_eq!(trends.average_income, dec!(2.50));
        assert_eq!(trends.average_expense, dec!(1.00));
        assert_eq!(trends.average_net, dec!(1.50));
    }

    #[test]
    fn test_forecast_uses_recent_months() {
        let history = [
            (dec!(3000.00), dec!(2000.00)),
            (dec!(1000.00), dec!(1000.00)),
        ];
        let forecast = StatsService::forecast(&history, 3);

        assert_eq!(forecast.based_on_months, 2);
        assert_eq!(forecast.predicted_income, dec!(6000.00));
        assert_eq!(forecast.predicted_expense, dec!(4500.00));
        assert_eq!(forecast.predicted_balance, dec!(1500.00));
        assert_eq!(forecast.confidence, 45);
    }

    #[test]
    fn test_forecast_without_history() {
        let forecast = StatsService::forecast(&[], 3);
        assert_eq!(forecast.predicted_income, Decimal::ZERO);
        assert_eq!(forecast.confidence, 20);
    }

    #[test]
    fn test_forecast_caps_lookback() {
        let history = vec![(dec!(100), dec!(50)); 9];
        let forecast = StatsService::forecast(&history, 1);
        assert_eq!(forecast.based_on_months, FORECAST_LOOKBACK_MONTHS);
        assert_eq!(forecast.predicted_income, dec!(100));
    }

    #[rstest]
    #[case(0, 20)]
    #[case(1, 45)]
    #[case(2, 45)]
    #[case(3, 65)]
    #[case(5, 65)]
    #[case(6, 85)]
    #[case(12, 85)]
    fn test_confidence(#[case] months: usize, #[case] expected: u8) {
        assert_eq!(StatsService::confidence(months), expected);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(StatsService::percentage(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(StatsService::percentage(dec!(1), dec!(3)), dec!(33.33));
    }

    #[test]
    fn test_window_starts() {
        let today = date(2024, 3, 15);
        assert_eq!(StatsService::monthly_window_start(today, 12), date(2023, 4, 1));
        assert_eq!(StatsService::monthly_window_start(today, 1), date(2024, 3, 1));
        assert_eq!(StatsService::daily_window_start(today, 30), date(2024, 2, 15));
    }
}
