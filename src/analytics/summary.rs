//! The current month's spending at a glance, compared with the month before.

use std::collections::BTreeMap;

use axum::{Extension, Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    analytics::{
        AnalyticsState, Change, add_amount, get_month_expenses, get_month_total, percentage,
        sum_by_category, total_amount,
    },
    auth::UserID,
    db::lock_connection,
    expense::{Category, Expense},
    period::YearMonth,
    savings_goal::{SavingsGoal, get_savings_goal_for_month},
};

/// How the month's spending measures up against its goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    pub savings_goal: Decimal,
    pub remaining_to_save: Decimal,
    /// Not clamped, so it is negative when overspent.
    pub percentage_achieved: Decimal,
    pub is_overspending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategory {
    pub name: Category,
    pub amount: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendDay {
    pub date: Date,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMonthSummary {
    pub year: i32,
    pub month: u8,
    pub total_spent: Decimal,
    pub budget_progress: Option<BudgetProgress>,
    pub top_category: Option<TopCategory>,
    pub average_daily_spend: Decimal,
    pub highest_spend_day: Option<SpendDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousMonthSummary {
    pub year: i32,
    pub month: u8,
    pub total_spent: Decimal,
}

/// Whether spending went up since the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increased,
    /// Also used when spending did not change.
    Decreased,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTrend {
    pub monthly_change: Change,
    pub direction: Direction,
}

/// The response body for the spending summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub current_month: CurrentMonthSummary,
    pub previous_month: PreviousMonthSummary,
    pub trend: SpendingTrend,
}

/// Summarise the expenses of the `current` month.
///
/// `goal` is the goal for `current`, if one is set. Ties for the top category
/// go to the category declared first, and ties for the highest spend day go
/// to the earliest day.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the month's amounts are too large to add up.
pub fn spending_summary(
    current: YearMonth,
    current_expenses: &[Expense],
    previous_total: Decimal,
    goal: Option<&SavingsGoal>,
) -> Result<SpendingSummary, Error> {
    let total_spent = total_amount(current_expenses)?;

    let mut top_category: Option<(Category, Decimal)> = None;
    for (category, amount) in sum_by_category(current_expenses)? {
        if top_category.is_none_or(|(_, top_amount)| amount > top_amount) {
            top_category = Some((category, amount));
        }
    }

    let mut daily_totals: BTreeMap<Date, Decimal> = BTreeMap::new();
    for expense in current_expenses {
        add_amount(
            daily_totals.entry(expense.date).or_insert(Decimal::ZERO),
            expense.amount,
        )?;
    }
    let mut highest_spend_day: Option<SpendDay> = None;
    for (date, amount) in daily_totals {
        if highest_spend_day
            .as_ref()
            .is_none_or(|highest| amount > highest.amount)
        {
            highest_spend_day = Some(SpendDay { date, amount });
        }
    }

    let budget_progress = goal.map(|goal| {
        let remaining_to_save = goal.target_amount - total_spent;

        BudgetProgress {
            savings_goal: goal.target_amount,
            remaining_to_save,
            percentage_achieved: percentage(remaining_to_save, goal.target_amount),
            is_overspending: total_spent > goal.target_amount,
        }
    });

    let monthly_change = Change::between(total_spent, previous_total);
    let direction = if monthly_change.amount > Decimal::ZERO {
        Direction::Increased
    } else {
        Direction::Decreased
    };
    let previous = current.previous();

    Ok(SpendingSummary {
        current_month: CurrentMonthSummary {
            year: current.year,
            month: current.month,
            total_spent,
            budget_progress,
            top_category: top_category.map(|(name, amount)| TopCategory {
                name,
                amount,
                percentage: percentage(amount, total_spent),
            }),
            average_daily_spend: total_spent / Decimal::from(current.days()),
            highest_spend_day,
        },
        previous_month: PreviousMonthSummary {
            year: previous.year,
            month: previous.month,
            total_spent: previous_total,
        },
        trend: SpendingTrend {
            monthly_change,
            direction,
        },
    })
}

/// Get a summary of the logged in user's spending this month.
pub async fn get_spending_summary(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<SpendingSummary>, Error> {
    let current = state.current_month()?;

    let connection = lock_connection(&state.db_connection)?;
    let current_expenses = get_month_expenses(user_id, current, &connection)?;
    let previous_total = get_month_total(user_id, current.previous(), &connection)?;
    let goal = get_savings_goal_for_month(user_id, current, &connection)?;

    spending_summary(current, &current_expenses, previous_total, goal.as_ref()).map(Json)
}
