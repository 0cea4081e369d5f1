//! Endpoints for reading a user's savings goals.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    analytics::get_month_total,
    auth::UserID,
    db::lock_connection,
    pagination::SortOrder,
    period::YearMonth,
    savings_goal::{
        GoalSortField, GoalStatus, GoalWithStatus, SavingsGoal, get_savings_goal_for_month,
        list_savings_goals,
    },
    timezone::local_today,
};

/// The state needed for reading savings goals.
#[derive(Debug, Clone)]
pub struct GoalsState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl GoalsState {
    /// The current month in the server's timezone.
    pub fn current_month(&self) -> Result<YearMonth, Error> {
        local_today(&self.local_timezone).map(YearMonth::from_date)
    }
}

/// The query parameters accepted by the goal list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalListQuery {
    /// Only list goals in this year.
    pub year: Option<i32>,
    /// The field to sort by.
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    pub sort_order: Option<String>,
}

/// List the logged in user's savings goals.
pub async fn list_savings_goals_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<GoalListQuery>,
) -> Result<Json<Vec<SavingsGoal>>, Error> {
    let sort_by = match query.sort_by.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => GoalSortField::from_str(raw)?,
        None => GoalSortField::default(),
    };
    let sort_order = SortOrder::from_param(query.sort_order.as_deref());

    let connection = lock_connection(&state.db_connection)?;

    list_savings_goals(user_id, query.year, sort_by, sort_order, &connection).map(Json)
}

/// Get the goal for `period` together with how the month's spending measures up.
///
/// # Errors
/// Returns [Error::NoSavingsGoal] if no goal is set for `period`.
pub fn get_goal_with_status(
    user_id: UserID,
    period: YearMonth,
    connection: &Connection,
) -> Result<GoalWithStatus, Error> {
    let goal = get_savings_goal_for_month(user_id, period, connection)?.ok_or(
        Error::NoSavingsGoal {
            year: period.year,
            month: period.month,
        },
    )?;
    let total_expenses = get_month_total(user_id, period, connection)?;
    let status = GoalStatus::new(goal.target_amount, total_expenses);

    Ok(GoalWithStatus { goal, status })
}

/// Get the logged in user's goal for the current month.
pub async fn get_current_goal_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<GoalWithStatus>, Error> {
    let period = state.current_month()?;
    let connection = lock_connection(&state.db_connection)?;

    get_goal_with_status(user_id, period, &connection).map(Json)
}

/// Get the logged in user's goal for a given month.
pub async fn get_goal_for_month_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserID>,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<GoalWithStatus>, Error> {
    let period = YearMonth::new(year, month)?;
    let connection = lock_connection(&state.db_connection)?;

    get_goal_with_status(user_id, period, &connection).map(Json)
}
