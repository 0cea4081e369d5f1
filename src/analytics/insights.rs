//! Advisory messages generated from the current month's spending.

use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    analytics::{
        AnalyticsState, checked_sum, get_month_expenses, percentage, round_percentage,
        sum_by_category,
    },
    auth::UserID,
    db::lock_connection,
    expense::Category,
    savings_goal::{SavingsGoal, get_savings_goal_for_month},
};

/// Category increases above this percentage are flagged.
const CATEGORY_INCREASE_THRESHOLD: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
/// Goal achievement at or above this percentage is praised.
const SAVINGS_PROGRESS_THRESHOLD: Decimal = Decimal::from_parts(75, 0, 0, false, 0);
/// Categories taking more than this percentage of the month's spending are pointed out.
const CATEGORY_SHARE_THRESHOLD: Decimal = Decimal::from_parts(30, 0, 0, false, 0);
/// A no-spend day is suggested once spending passes this fraction of the target.
const SUGGESTION_TARGET_FRACTION: Decimal = Decimal::from_parts(8, 0, 0, false, 1);

const NO_SPEND_DAY_SUGGESTION: &str =
    "Try a no-spend day tomorrow to get closer to your savings goal.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    OverspendingWarning,
    SavingsProgress,
    CategoryInsight,
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Positive,
    Info,
    Tip,
}

/// A single advisory message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightType,
    /// The category the message is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub message: String,
    pub severity: Severity,
}

/// Apply the insight rules to a month's per-category spending.
///
/// The rules are applied in this order, and each may add any number of
/// messages:
/// 1. categories that grew by more than 30% since `previous`,
/// 2. goal achievement of at least 75%,
/// 3. categories making up more than 30% of the month's spending,
/// 4. spending above 80% of the goal's target.
///
/// Rules 2 and 4 are skipped when `goal` is `None`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the month's amounts are too large to add up.
pub fn financial_insights(
    current: &BTreeMap<Category, Decimal>,
    previous: &BTreeMap<Category, Decimal>,
    goal: Option<&SavingsGoal>,
) -> Result<Vec<Insight>, Error> {
    let mut insights = Vec::new();
    let total_spent = checked_sum(current.values().copied())?;

    for (category, amount) in current {
        let Some(previous_amount) = previous.get(category) else {
            continue;
        };
        let increase = percentage(amount - previous_amount, *previous_amount);

        if increase > CATEGORY_INCREASE_THRESHOLD {
            insights.push(Insight {
                kind: InsightType::OverspendingWarning,
                category: Some(*category),
                message: format!(
                    "Your {category} spending has increased by {}% this month.",
                    round_percentage(increase)
                ),
                severity: Severity::Warning,
            });
        }
    }

    if let Some(goal) = goal {
        let achieved = percentage(goal.target_amount - total_spent, goal.target_amount);

        if achieved >= SAVINGS_PROGRESS_THRESHOLD {
            insights.push(Insight {
                kind: InsightType::SavingsProgress,
                category: None,
                message: format!(
                    "You're {}% of the way to your monthly savings goal!",
                    round_percentage(achieved)
                ),
                severity: Severity::Positive,
            });
        }
    }

    for (category, amount) in current {
        let share = percentage(*amount, total_spent);

        if share > CATEGORY_SHARE_THRESHOLD {
            insights.push(Insight {
                kind: InsightType::CategoryInsight,
                category: Some(*category),
                message: format!(
                    "{category} makes up {}% of your monthly expenses.",
                    round_percentage(share)
                ),
                severity: Severity::Info,
            });
        }
    }

    if goal.is_some_and(|goal| total_spent > goal.target_amount * SUGGESTION_TARGET_FRACTION) {
        insights.push(Insight {
            kind: InsightType::Suggestion,
            category: None,
            message: NO_SPEND_DAY_SUGGESTION.to_owned(),
            severity: Severity::Tip,
        });
    }

    Ok(insights)
}

/// The response body for the insights.
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
}

/// Get advice for the logged in user based on this month's spending.
pub async fn get_insights(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<InsightsResponse>, Error> {
    let current = state.current_month()?;

    let connection = lock_connection(&state.db_connection)?;
    let current_expenses = get_month_expenses(user_id, current, &connection)?;
    let previous_expenses = get_month_expenses(user_id, current.previous(), &connection)?;
    let goal = get_savings_goal_for_month(user_id, current, &connection)?;

    Ok(Json(InsightsResponse {
        insights: financial_insights(
            &sum_by_category(&current_expenses)?,
            &sum_by_category(&previous_expenses)?,
            goal.as_ref(),
        )?,
    }))
}
