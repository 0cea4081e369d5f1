//! Grouped sums, percentages and period-over-period changes.
//!
//! All arithmetic is done with [Decimal] so that summing many small amounts
//! never picks up binary floating point error.

use std::collections::BTreeMap;

use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    Error,
    auth::UserID,
    expense::{Category, Expense, ExpenseFilter, get_expenses},
    period::YearMonth,
};

/// Add `amount` to `sum` in place.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn add_amount(sum: &mut Decimal, amount: Decimal) -> Result<(), Error> {
    *sum = sum.checked_add(amount).ok_or(Error::AmountOverflow)?;

    Ok(())
}

/// The sum of `amounts`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, Error> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, amount| {
            sum.checked_add(amount).ok_or(Error::AmountOverflow)
        })
}

/// The sum of the amounts of `expenses`.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn total_amount(expenses: &[Expense]) -> Result<Decimal, Error> {
    checked_sum(expenses.iter().map(|expense| expense.amount))
}

/// The sum of the amounts of `expenses` for each category present.
///
/// # Errors
/// Returns [Error::AmountOverflow] if a sum does not fit in a [Decimal].
pub fn sum_by_category(expenses: &[Expense]) -> Result<BTreeMap<Category, Decimal>, Error> {
    let mut sums = BTreeMap::new();

    for expense in expenses {
        add_amount(
            sums.entry(expense.category).or_insert(Decimal::ZERO),
            expense.amount,
        )?;
    }

    Ok(sums)
}

/// `part` as a percentage of `whole`, or zero when `whole` is zero.
///
/// Ratios too large to represent as a percentage also give zero.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Round a percentage to the nearest whole number for display, halves away from zero.
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// The difference between a current and a previous amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    /// `current - previous`.
    pub amount: Decimal,
    /// The change as a percentage of `previous`, zero when `previous` is zero.
    pub percentage: Decimal,
}

impl Change {
    /// The change going from `previous` to `current`.
    pub fn between(current: Decimal, previous: Decimal) -> Self {
        let amount = current - previous;

        Self {
            amount,
            percentage: percentage(amount, previous),
        }
    }
}

/// Get the user's expenses for `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_month_expenses(
    user_id: UserID,
    period: YearMonth,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    get_expenses(user_id, &ExpenseFilter::for_month(period), connection)
}

/// The sum of the user's expenses for `period`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error, or
/// [Error::AmountOverflow] if the sum does not fit in a [Decimal].
pub fn get_month_total(
    user_id: UserID,
    period: YearMonth,
    connection: &Connection,
) -> Result<Decimal, Error> {
    total_amount(&get_month_expenses(user_id, period, connection)?)
}
