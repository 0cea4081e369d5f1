//! How a user's spending splits across categories.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    analytics::{AnalyticsState, percentage, sum_by_category, total_amount},
    auth::UserID,
    db::lock_connection,
    expense::{Category, Expense, ExpenseFilter, get_expenses},
    period::{YearMonth, parse_optional_date},
};

/// One category's part of the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    /// The category.
    pub category: Category,
    /// The sum spent in the category.
    pub amount: Decimal,
    /// `amount` as a percentage of the total.
    pub percentage: Decimal,
}

/// The spending per category for a selection of expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDistribution {
    /// The sum of all selected expenses.
    pub total: Decimal,
    /// The categories with spending, largest amount first.
    pub categories: Vec<CategoryShare>,
}

/// Split the total of `expenses` by category.
///
/// Categories with equal amounts keep their declaration order.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the amounts are too large to add up.
pub fn category_distribution(expenses: &[Expense]) -> Result<CategoryDistribution, Error> {
    let total = total_amount(expenses)?;
    let mut categories: Vec<CategoryShare> = sum_by_category(expenses)?
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category,
            amount,
            percentage: percentage(amount, total),
        })
        .collect();
    categories.sort_by(|a, b| b.amount.cmp(&a.amount));

    Ok(CategoryDistribution { total, categories })
}

/// The query parameters accepted by the category distribution.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionQuery {
    /// Select the expenses in this year. Needs `month`.
    pub year: Option<i32>,
    /// Select the expenses in this month. Needs `year`.
    pub month: Option<u8>,
    /// Select the expenses on or after this date. Needs `end_date`.
    pub start_date: Option<String>,
    /// Select the expenses on or before this date. Needs `start_date`.
    pub end_date: Option<String>,
}

impl DistributionQuery {
    /// Build the expense filter.
    ///
    /// A complete (year, month) pair takes precedence over a complete date
    /// range. Incomplete pairs are ignored.
    fn filter(&self) -> Result<ExpenseFilter, Error> {
        if let (Some(year), Some(month)) = (self.year, self.month) {
            return YearMonth::new(year, month).map(ExpenseFilter::for_month);
        }

        let start_date = parse_optional_date(self.start_date.as_deref(), "startDate")?;
        let end_date = parse_optional_date(self.end_date.as_deref(), "endDate")?;

        match (start_date, end_date) {
            (Some(start_date), Some(end_date)) => Ok(ExpenseFilter::between(start_date, end_date)),
            _ => Ok(ExpenseFilter::default()),
        }
    }
}

/// Get the logged in user's spending per category.
pub async fn get_category_distribution(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DistributionQuery>,
) -> Result<Json<CategoryDistribution>, Error> {
    let filter = query.filter()?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = get_expenses(user_id, &filter, &connection)?;

    category_distribution(&expenses).map(Json)
}
