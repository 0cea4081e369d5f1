//! The endpoint for setting a month's savings goal.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    period::YearMonth,
    savings_goal::{GoalUpsert, NewSavingsGoal, SavingsGoal, upsert_savings_goal},
};

/// The state needed for setting a savings goal.
#[derive(Debug, Clone)]
pub struct SetGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SetGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for setting a savings goal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalForm {
    /// The monthly spending target.
    pub target_amount: Decimal,
    /// The year the goal applies to.
    pub year: i32,
    /// The month the goal applies to (1-12).
    pub month: u8,
}

/// Set the logged in user's goal for a month.
///
/// Responds with 201 Created if the month had no goal, otherwise replaces the
/// target of the existing goal and responds with 200 OK.
pub async fn set_savings_goal_endpoint(
    State(state): State<SetGoalState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<SavingsGoalForm>,
) -> Result<(StatusCode, Json<SavingsGoal>), Error> {
    let period = YearMonth::new(form.year, form.month)?;
    let new_goal = NewSavingsGoal::new(user_id, form.target_amount, period)?;

    let connection = lock_connection(&state.db_connection)?;

    match upsert_savings_goal(new_goal, &connection)? {
        GoalUpsert::Created(goal) => {
            tracing::debug!("User {user_id} set a savings goal for {period}.");
            Ok((StatusCode::CREATED, Json(goal)))
        }
        GoalUpsert::Updated(goal) => {
            tracing::debug!("User {user_id} updated their savings goal for {period}.");
            Ok((StatusCode::OK, Json(goal)))
        }
    }
}
