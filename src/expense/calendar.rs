//! Month views of a user's expenses: a per-day calendar and per-category totals.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    AppState, Error,
    analytics::{add_amount, sum_by_category, total_amount},
    auth::UserID,
    db::lock_connection,
    expense::{Category, Expense, ExpenseFilter, get_expenses},
    period::YearMonth,
};

/// The state needed for the month views.
#[derive(Debug, Clone)]
pub struct ExpenseCalendarState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseCalendarState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The expenses on one day of the calendar.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    /// The sum of `expenses`.
    pub total: Decimal,
    /// The expenses dated on the day.
    pub expenses: Vec<Expense>,
}

/// Group `expenses` by day of the month.
///
/// Days without expenses are left out.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a day's amounts are too large to add up.
pub fn build_calendar(expenses: Vec<Expense>) -> Result<BTreeMap<u8, CalendarDay>, Error> {
    let mut calendar: BTreeMap<u8, CalendarDay> = BTreeMap::new();

    for expense in expenses {
        let day = calendar.entry(expense.date.day()).or_default();
        add_amount(&mut day.total, expense.amount)?;
        day.expenses.push(expense);
    }

    Ok(calendar)
}

/// Get the logged in user's expenses for a month keyed by day of the month.
pub async fn get_expense_calendar(
    State(state): State<ExpenseCalendarState>,
    Extension(user_id): Extension<UserID>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<BTreeMap<u8, CalendarDay>>, Error> {
    let period = YearMonth::new(year, month)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = get_expenses(user_id, &ExpenseFilter::for_month(period), &connection)?;

    build_calendar(expenses).map(Json)
}

/// The total spent in a month and its split by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The sum of all expenses in the month.
    pub total: Decimal,
    /// The sum for each category with at least one expense.
    pub categories: BTreeMap<Category, Decimal>,
}

/// Get the logged in user's spending per category for a month.
pub async fn get_monthly_summary(
    State(state): State<ExpenseCalendarState>,
    Extension(user_id): Extension<UserID>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<MonthlySummary>, Error> {
    let period = YearMonth::new(year, month)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = get_expenses(user_id, &ExpenseFilter::for_month(period), &connection)?;

    Ok(Json(MonthlySummary {
        total: total_amount(&expenses)?,
        categories: sum_by_category(&expenses)?,
    }))
}
