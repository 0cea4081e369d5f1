//! Spending over time, bucketed by day, ISO week or month.

use std::{collections::BTreeMap, str::FromStr};

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    analytics::{AnalyticsState, add_amount},
    auth::UserID,
    db::lock_connection,
    expense::{Category, Expense, ExpenseFilter, get_expenses},
    period::{iso_week_bounds, parse_optional_date},
};

/// The number of days covered when no start date is given, including today.
const DEFAULT_TREND_DAYS: i64 = 30;

/// The size of the time buckets spending is summed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendPeriod {
    /// One bucket per calendar day.
    Daily,
    /// One bucket per ISO week, Monday to Sunday.
    Weekly,
    /// One bucket per calendar month.
    Monthly,
}

impl FromStr for TrendPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TrendPeriod::Daily),
            "weekly" => Ok(TrendPeriod::Weekly),
            "monthly" => Ok(TrendPeriod::Monthly),
            _ => Err(Error::Validation("Invalid period specified".to_owned())),
        }
    }
}

/// The spending on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// The day.
    pub date: Date,
    /// The sum spent on the day.
    pub amount: Decimal,
}

/// The spending in one ISO week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTotal {
    /// The ISO week label, e.g. "2024-W07".
    pub week: String,
    /// The Monday the week starts on.
    pub start_date: Date,
    /// The Sunday the week ends on, inclusive.
    pub end_date: Date,
    /// The sum spent in the week.
    pub amount: Decimal,
}

/// The spending in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// The year.
    pub year: i32,
    /// The month number (1-12).
    pub month: u8,
    /// The English month name.
    pub month_name: &'static str,
    /// The sum spent in the month.
    pub amount: Decimal,
}

/// A bucket of a spending trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrendBucket {
    /// A day's spending.
    Daily(DailyTotal),
    /// A week's spending.
    Weekly(WeeklyTotal),
    /// A month's spending.
    Monthly(MonthlyTotal),
}

/// Sum `expenses` into buckets of `period`, oldest bucket first.
///
/// Buckets without expenses are left out.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a bucket's amounts are too large to add up.
pub fn spending_trends(
    expenses: &[Expense],
    period: TrendPeriod,
) -> Result<Vec<TrendBucket>, Error> {
    let buckets = match period {
        TrendPeriod::Daily => sum_by_key(expenses, |expense| expense.date)?
            .into_iter()
            .map(|(date, amount)| TrendBucket::Daily(DailyTotal { date, amount }))
            .collect(),
        TrendPeriod::Weekly => sum_by_key(expenses, |expense| {
            let (year, week, _) = expense.date.to_iso_week_date();
            (year, week)
        })?
        .into_iter()
        .filter_map(|((year, week), amount)| {
            let (start_date, end_date) = iso_week_bounds(year, week)?;

            Some(TrendBucket::Weekly(WeeklyTotal {
                week: format!("{year}-W{week:02}"),
                start_date,
                end_date,
                amount,
            }))
        })
        .collect(),
        TrendPeriod::Monthly => sum_by_key(expenses, Expense::year_month)?
            .into_iter()
            .map(|(period, amount)| {
                TrendBucket::Monthly(MonthlyTotal {
                    year: period.year,
                    month: period.month,
                    month_name: period.name(),
                    amount,
                })
            })
            .collect(),
    };

    Ok(buckets)
}

fn sum_by_key<K: Ord>(
    expenses: &[Expense],
    key: impl Fn(&Expense) -> K,
) -> Result<BTreeMap<K, Decimal>, Error> {
    let mut sums = BTreeMap::new();

    for expense in expenses {
        add_amount(sums.entry(key(expense)).or_insert(Decimal::ZERO), expense.amount)?;
    }

    Ok(sums)
}

/// The query parameters accepted by the spending trends.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsQuery {
    /// "daily", "weekly" or "monthly".
    pub period: Option<String>,
    /// The first day to include. Defaults to 29 days before `end_date`.
    pub start_date: Option<String>,
    /// The last day to include. Defaults to today.
    pub end_date: Option<String>,
    /// Only include expenses in this category.
    pub category: Option<String>,
}

impl TrendsQuery {
    fn parse(&self, today: Date) -> Result<(TrendPeriod, ExpenseFilter), Error> {
        let period = TrendPeriod::from_str(self.period.as_deref().unwrap_or_default())?;
        let end_date = parse_optional_date(self.end_date.as_deref(), "endDate")?.unwrap_or(today);
        let start_date = match parse_optional_date(self.start_date.as_deref(), "startDate")? {
            Some(start_date) => start_date,
            None => end_date
                .checked_sub(Duration::days(DEFAULT_TREND_DAYS - 1))
                .unwrap_or(Date::MIN),
        };
        let category = match self.category.as_deref().filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(Category::from_str(raw)?),
            None => None,
        };

        Ok((
            period,
            ExpenseFilter::between(start_date, end_date).category(category),
        ))
    }
}

/// The response body for the spending trends.
#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    /// The buckets, oldest first.
    pub trends: Vec<TrendBucket>,
}

/// Get the logged in user's spending over time.
pub async fn get_spending_trends(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<TrendsResponse>, Error> {
    let (period, filter) = query.parse(state.today()?)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = get_expenses(user_id, &filter, &connection)?;

    Ok(Json(TrendsResponse {
        trends: spending_trends(&expenses, period)?,
    }))
}
