//! Database queries for savings goals.

use std::str::FromStr;

use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params_from_iter,
    types::Value,
};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    db::get_decimal,
    pagination::SortOrder,
    period::YearMonth,
    savings_goal::{NewSavingsGoal, SavingsGoal, SavingsGoalId},
};

/// Create the savings goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_savings_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                target_amount TEXT NOT NULL CHECK (CAST(target_amount AS REAL) >= 0),
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(user_id, year, month),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

const SELECT_SAVINGS_GOAL: &str =
    "SELECT id, user_id, target_amount, year, month, created_at, updated_at FROM savings_goal";

/// Map a database row to a SavingsGoal.
pub fn map_savings_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        target_amount: get_decimal(row, 2)?,
        year: row.get(3)?,
        month: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// The result of setting a goal.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalUpsert {
    /// There was no goal for the month, so one was created.
    Created(SavingsGoal),
    /// The month already had a goal and its target was replaced.
    Updated(SavingsGoal),
}

impl GoalUpsert {
    /// The stored goal.
    pub fn goal(&self) -> &SavingsGoal {
        match self {
            GoalUpsert::Created(goal) | GoalUpsert::Updated(goal) => goal,
        }
    }
}

/// Set the target for a user's month, creating the goal if the month has none.
///
/// The write is a single statement keyed on the unique (user, year, month)
/// constraint, so concurrent requests for the same month never create
/// duplicate goals. It runs in one transaction with the check for an existing
/// goal, which decides whether the goal was created or updated.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn upsert_savings_goal(
    new_goal: NewSavingsGoal,
    connection: &Connection,
) -> Result<GoalUpsert, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let existed: bool = transaction
        .prepare(
            "SELECT EXISTS(
                SELECT 1 FROM savings_goal WHERE user_id = ?1 AND year = ?2 AND month = ?3
             )",
        )?
        .query_row(
            (
                new_goal.user_id.as_i64(),
                new_goal.period.year,
                new_goal.period.month,
            ),
            |row| row.get(0),
        )?;

    let goal = transaction
        .prepare(
            "INSERT INTO savings_goal (user_id, target_amount, year, month, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id, year, month) DO UPDATE
             SET target_amount = excluded.target_amount, updated_at = excluded.updated_at
             RETURNING id, user_id, target_amount, year, month, created_at, updated_at",
        )?
        .query_row(
            (
                new_goal.user_id.as_i64(),
                new_goal.target_amount.to_string(),
                new_goal.period.year,
                new_goal.period.month,
                OffsetDateTime::now_utc(),
            ),
            map_savings_goal_row,
        )?;

    transaction.commit()?;

    if existed {
        Ok(GoalUpsert::Updated(goal))
    } else {
        Ok(GoalUpsert::Created(goal))
    }
}

/// Get the user's goal for `period`, if one is set.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_savings_goal_for_month(
    user_id: UserID,
    period: YearMonth,
    connection: &Connection,
) -> Result<Option<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_SAVINGS_GOAL} WHERE user_id = ?1 AND year = ?2 AND month = ?3"
        ))?
        .query_row((user_id.as_i64(), period.year, period.month), map_savings_goal_row)
        .optional()
        .map_err(Error::from)
}

/// Get the user's goals from `first` to `last` inclusive in chronological order.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_savings_goals_between(
    user_id: UserID,
    first: YearMonth,
    last: YearMonth,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    let month_index = |period: YearMonth| i64::from(period.year) * 12 + i64::from(period.month);

    connection
        .prepare(&format!(
            "{SELECT_SAVINGS_GOAL}
             WHERE user_id = ?1 AND (year * 12 + month) BETWEEN ?2 AND ?3
             ORDER BY year ASC, month ASC"
        ))?
        .query_map(
            (user_id.as_i64(), month_index(first), month_index(last)),
            map_savings_goal_row,
        )?
        .map(|goal_result| goal_result.map_err(Error::from))
        .collect()
}

/// The fields a goal list can be sorted by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GoalSortField {
    /// Sort in the order goals were created.
    #[default]
    Unsorted,
    /// Sort by year.
    Year,
    /// Sort by month number.
    Month,
    /// Sort by target amount.
    TargetAmount,
    /// Sort by creation time.
    CreatedAt,
}

impl GoalSortField {
    fn order_by(&self) -> Option<&'static str> {
        match self {
            GoalSortField::Unsorted => None,
            GoalSortField::Year => Some("year"),
            GoalSortField::Month => Some("month"),
            GoalSortField::TargetAmount => Some("CAST(target_amount AS REAL)"),
            GoalSortField::CreatedAt => Some("created_at"),
        }
    }
}

impl FromStr for GoalSortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(GoalSortField::Year),
            "month" => Ok(GoalSortField::Month),
            "targetAmount" => Ok(GoalSortField::TargetAmount),
            "createdAt" => Ok(GoalSortField::CreatedAt),
            other => Err(Error::Validation(format!(
                "sortBy must be one of year, month, targetAmount or createdAt, got \"{other}\""
            ))),
        }
    }
}

/// Get the user's goals, optionally only those in `year`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn list_savings_goals(
    user_id: UserID,
    year: Option<i32>,
    sort_by: GoalSortField,
    sort_order: SortOrder,
    connection: &Connection,
) -> Result<Vec<SavingsGoal>, Error> {
    let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(year) = year {
        query_parameters.push(Value::Integer(year.into()));
        where_clause_parts.push(format!("year = ?{}", query_parameters.len()));
    }

    let order_clause = match sort_by.order_by() {
        Some(column) => format!(
            "ORDER BY {column} {order}, id {order}",
            order = sort_order.as_sql()
        ),
        None => "ORDER BY id ASC".to_owned(),
    };
    let query_string = format!(
        "{SELECT_SAVINGS_GOAL} WHERE {} {order_clause}",
        where_clause_parts.join(" AND ")
    );
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_savings_goal_row)?
        .map(|goal_result| goal_result.map_err(Error::from))
        .collect()
}

/// Delete the goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::SavingsGoalNotFound] if `id` does not refer to a goal owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_savings_goal(
    id: SavingsGoalId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::SavingsGoalNotFound);
    }

    Ok(())
}
