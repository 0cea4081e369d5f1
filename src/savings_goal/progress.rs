//! The savings goal progress overview: recent goals and how each month went.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    analytics::get_month_total,
    auth::UserID,
    db::lock_connection,
    period::{YearMonth, trailing_months},
    savings_goal::{GoalStatus, get_savings_goals_between, list::GoalsState},
};

/// One month of the progress overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// The year of the goal.
    pub year: i32,
    /// The month of the goal (1-12).
    pub month: u8,
    /// The goal's spending target.
    pub target_amount: Decimal,
    /// The sum of the month's expenses.
    pub total_expenses: Decimal,
    /// The share of the target left unspent, clamped to 0..=100.
    pub percentage_achieved: Decimal,
    /// Whether the month's spending went over the target.
    pub is_overspending: bool,
}

/// Get the progress of the user's goals in the `months` months ending with
/// `current`, oldest first.
///
/// Months without a goal are left out.
///
/// # Errors
/// Returns [Error::Validation] if `months` is out of range, or
/// [Error::SqlError] if there is a SQL error.
pub fn get_goal_progress(
    user_id: UserID,
    current: YearMonth,
    months: Option<u32>,
    connection: &Connection,
) -> Result<Vec<GoalProgress>, Error> {
    let window = trailing_months(current, months)?;
    let first = window.first().copied().unwrap_or(current);
    let goals = get_savings_goals_between(user_id, first, current, connection)?;

    goals
        .into_iter()
        .map(|goal| {
            let total_expenses = get_month_total(user_id, goal.period(), connection)?;
            let status = GoalStatus::new(goal.target_amount, total_expenses);

            Ok(GoalProgress {
                year: goal.year,
                month: goal.month,
                target_amount: goal.target_amount,
                total_expenses,
                percentage_achieved: status.percentage_achieved,
                is_overspending: status.is_overspending,
            })
        })
        .collect()
}

/// The query parameters accepted by the progress overview.
#[derive(Debug, Default, Deserialize)]
pub struct GoalProgressQuery {
    /// How many months to look back over, including the current one.
    pub months: Option<u32>,
}

/// Get the logged in user's goal progress over recent months.
pub async fn get_goal_progress_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<GoalProgressQuery>,
) -> Result<Json<Vec<GoalProgress>>, Error> {
    let current = state.current_month()?;
    let connection = lock_connection(&state.db_connection)?;

    get_goal_progress(user_id, current, query.months, &connection).map(Json)
}
