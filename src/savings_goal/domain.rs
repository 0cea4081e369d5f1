//! Savings goal types and the goal status shown alongside a goal.

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, auth::UserID, expense::MAX_AMOUNT, period::YearMonth};

/// The database ID of a savings goal.
pub type SavingsGoalId = i64;

/// The most a user wants to spend in a month so that the rest is saved.
///
/// There is at most one goal per user and month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: SavingsGoalId,
    /// The user who set the goal.
    pub user_id: UserID,
    /// The monthly spending target. Never negative.
    pub target_amount: Decimal,
    /// The year of the month the goal applies to.
    pub year: i32,
    /// The month the goal applies to (1-12).
    pub month: u8,
    /// When the goal was first set.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the target was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SavingsGoal {
    /// The month the goal applies to.
    pub fn period(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// A validated goal ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSavingsGoal {
    /// The user setting the goal.
    pub user_id: UserID,
    /// The monthly spending target.
    pub target_amount: Decimal,
    /// The month the goal applies to.
    pub period: YearMonth,
}

impl NewSavingsGoal {
    /// Create a goal for `period`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `target_amount` is negative or above [MAX_AMOUNT].
    pub fn new(user_id: UserID, target_amount: Decimal, period: YearMonth) -> Result<Self, Error> {
        if target_amount < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "targetAmount must not be negative, got {target_amount}"
            )));
        }

        if target_amount > MAX_AMOUNT {
            return Err(Error::Validation(format!(
                "targetAmount must be at most {MAX_AMOUNT}, got {target_amount}"
            )));
        }

        Ok(Self {
            user_id,
            target_amount,
            period,
        })
    }
}

/// How a month's spending measures up against its goal.
///
/// The achievement percentage here is clamped to 0..=100 for display. The
/// analytics endpoints report the uncapped figure instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalStatus {
    /// The sum of the month's expenses.
    pub total_expenses: Decimal,
    /// The target minus the total, negative when overspent.
    pub remaining_amount: Decimal,
    /// The share of the target left unspent as a percentage between 0 and 100.
    pub percentage_achieved: Decimal,
    /// Whether the total is above the target.
    pub is_overspending: bool,
}

impl GoalStatus {
    /// Measure `total_expenses` against `target_amount`.
    ///
    /// A zero target has an achievement of zero.
    pub fn new(target_amount: Decimal, total_expenses: Decimal) -> Self {
        let percentage_achieved = total_expenses
            .checked_div(target_amount)
            .and_then(|spent_ratio| {
                (Decimal::ONE - spent_ratio).checked_mul(Decimal::ONE_HUNDRED)
            })
            .unwrap_or(Decimal::ZERO)
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

        Self {
            total_expenses,
            remaining_amount: target_amount - total_expenses,
            percentage_achieved,
            is_overspending: total_expenses > target_amount,
        }
    }
}

/// A goal with its current status, flattened into one JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalWithStatus {
    /// The goal.
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// How the month's spending measures up against it.
    #[serde(flatten)]
    pub status: GoalStatus,
}
