//! Encouragement messages for the current month's savings goal.

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    db::lock_connection,
    savings_goal::{
        GoalStatus,
        list::{GoalsState, get_goal_with_status},
    },
};

const HALFWAY: &str = "You're halfway to your savings goal!";
const ALMOST_THERE: &str = "You're almost there! Keep pushing towards your savings goal!";
const OVERSPENDING: &str =
    "You've spent more than your savings goal allows this month. Review your recent expenses.";
const NO_SPEND_DAY: &str = "Try a no-spend day tomorrow?";
const GOAL_ACHIEVED: &str = "Congratulations! You've achieved your savings goal for this month!";
const JUST_STARTING: &str = "You're just starting! Keep going, every little bit counts!";

/// The nudges for a goal of `target_amount` given how the month is going.
///
/// Each rule is checked on its own, so several nudges may apply at once and
/// they are always listed in the same order.
pub fn goal_nudges(target_amount: Decimal, status: &GoalStatus) -> Vec<&'static str> {
    let achieved = status.percentage_achieved;
    let mut nudges = Vec::new();

    if achieved >= Decimal::from(50) {
        nudges.push(HALFWAY);
    }

    if achieved >= Decimal::from(75) {
        nudges.push(ALMOST_THERE);
    }

    if status.is_overspending {
        nudges.push(OVERSPENDING);
    }

    if status.total_expenses < target_amount / Decimal::TWO {
        nudges.push(NO_SPEND_DAY);
    }

    if achieved >= Decimal::ONE_HUNDRED {
        nudges.push(GOAL_ACHIEVED);
    }

    if achieved < Decimal::from(25) {
        nudges.push(JUST_STARTING);
    }

    nudges
}

/// The nudges for the current month.
#[derive(Debug, Serialize)]
pub struct NudgesResponse {
    /// The messages in display order.
    pub nudges: Vec<&'static str>,
}

/// Get encouragement for the logged in user's goal for the current month.
///
/// Responds with 404 Not Found if the user has no goal for the current month.
pub async fn get_goal_nudges_endpoint(
    State(state): State<GoalsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<NudgesResponse>, Error> {
    let period = state.current_month()?;
    let connection = lock_connection(&state.db_connection)?;
    let goal = get_goal_with_status(user_id, period, &connection)?;

    Ok(Json(NudgesResponse {
        nudges: goal_nudges(goal.goal.target_amount, &goal.status),
    }))
}

#[cfg(test)]
mod goal_nudges_tests {
    use axum::http::StatusCode;
    use rust_decimal::Decimal;

    use crate::{
        endpoints,
        savings_goal::{
            GoalStatus,
            nudges::{
                ALMOST_THERE, GOAL_ACHIEVED, HALFWAY, JUST_STARTING, NO_SPEND_DAY, OVERSPENDING,
                goal_nudges,
            },
        },
        test_utils::{dec, get_test_server, log_in_test_user},
    };

    fn nudges_for(target: &str, spent: &str) -> Vec<&'static str> {
        let target = dec(target);
        goal_nudges(target, &GoalStatus::new(target, dec(spent)))
    }

    #[test]
    fn nothing_spent() {
        assert_eq!(
            nudges_for("400", "0"),
            vec![HALFWAY, ALMOST_THERE, NO_SPEND_DAY, GOAL_ACHIEVED]
        );
    }

    #[test]
    fn quarter_spent() {
        assert_eq!(
            nudges_for("400", "100"),
            vec![HALFWAY, ALMOST_THERE, NO_SPEND_DAY]
        );
    }

    #[test]
    fn exactly_half_spent() {
        assert_eq!(nudges_for("400", "200"), vec![HALFWAY]);
    }

    #[test]
    fn most_of_target_spent() {
        assert_eq!(nudges_for("400", "350"), vec![JUST_STARTING]);
    }

    #[test]
    fn overspent() {
        assert_eq!(nudges_for("400", "500"), vec![OVERSPENDING, JUST_STARTING]);
    }

    #[test]
    fn zero_target() {
        let status = GoalStatus::new(Decimal::ZERO, Decimal::ZERO);

        assert_eq!(goal_nudges(Decimal::ZERO, &status), vec![JUST_STARTING]);
    }

    #[tokio::test]
    async fn no_goal_is_not_found() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .get(endpoints::GOAL_NUDGES)
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
