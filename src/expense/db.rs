//! Database queries for expenses.
//!
//! Every query takes the owning [UserID] and includes it in the `WHERE`
//! clause, so one user can never read or change another user's expenses.

use std::str::FromStr;

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    db::get_decimal,
    expense::{Category, Expense, ExpenseBuilder, ExpenseId},
    pagination::{Pagination, SortOrder},
    period::YearMonth,
};

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                amount TEXT NOT NULL CHECK (CAST(amount AS REAL) >= 0),
                category TEXT NOT NULL CHECK (category IN
                    ('Food', 'Transport', 'Entertainment', 'Shopping', 'Health', 'Other')),
                description TEXT,
                date TEXT NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Month queries drive the analytics, date ranges drive the expense list.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_year_month ON expense(user_id, year, month);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

const SELECT_EXPENSE: &str = "SELECT id, user_id, amount, category, description, date, year, month, created_at, updated_at FROM expense";

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        amount: get_decimal(row, 2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        date: row.get(5)?,
        year: row.get(6)?,
        month: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Create a new expense in the database from a builder.
///
/// The year and month are taken from the builder's date.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the amount is negative,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(builder: ExpenseBuilder, connection: &Connection) -> Result<Expense, Error> {
    builder.validate()?;

    let now = OffsetDateTime::now_utc();
    let period = YearMonth::from_date(builder.date);

    let expense = connection
        .prepare(
            "INSERT INTO expense
                (user_id, amount, category, description, date, year, month, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING id, user_id, amount, category, description, date, year, month, created_at, updated_at",
        )?
        .query_row(
            (
                builder.user_id.as_i64(),
                builder.amount.to_string(),
                builder.category,
                builder.description,
                builder.date,
                period.year,
                period.month,
                now,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an expense owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!("{SELECT_EXPENSE} WHERE id = :id AND user_id = :user_id"))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::ExpenseNotFound,
            error => error.into(),
        })
}

/// Replace the amount, category, description and date of expense `id`.
///
/// The owner is taken from `builder.user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the new amount is negative,
/// - [Error::ExpenseNotFound] if `id` does not refer to an expense owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    builder: ExpenseBuilder,
    connection: &Connection,
) -> Result<Expense, Error> {
    builder.validate()?;

    let period = YearMonth::from_date(builder.date);

    let rows_affected = connection.execute(
        "UPDATE expense
         SET amount = ?1, category = ?2, description = ?3, date = ?4, year = ?5, month = ?6,
             updated_at = ?7
         WHERE id = ?8 AND user_id = ?9",
        (
            builder.amount.to_string(),
            builder.category,
            builder.description,
            builder.date,
            period.year,
            period.month,
            OffsetDateTime::now_utc(),
            id,
            builder.user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::ExpenseNotFound);
    }

    get_expense(id, builder.user_id, connection)
}

/// Delete the expense `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::ExpenseNotFound] if `id` does not refer to an expense owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::ExpenseNotFound);
    }

    Ok(())
}

/// Conditions that expenses must meet to be selected.
///
/// Unset fields do not restrict the selection. Date bounds are inclusive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseFilter {
    /// Only include expenses in this category.
    pub category: Option<Category>,
    /// Only include expenses on or after this date.
    pub start_date: Option<Date>,
    /// Only include expenses on or before this date.
    pub end_date: Option<Date>,
    /// Only include expenses in this year.
    pub year: Option<i32>,
    /// Only include expenses in this month (1-12).
    pub month: Option<u8>,
}

impl ExpenseFilter {
    /// Select the expenses in `period`.
    pub fn for_month(period: YearMonth) -> Self {
        Self {
            year: Some(period.year),
            month: Some(period.month),
            ..Default::default()
        }
    }

    /// Select the expenses in `year`.
    pub fn for_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Default::default()
        }
    }

    /// Select the expenses from `start` to `end` inclusive.
    pub fn between(start: Date, end: Date) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        }
    }

    /// Also restrict the selection to `category`.
    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut where_clause_parts = vec!["user_id = ?1".to_owned()];
        let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

        if let Some(category) = self.category {
            query_parameters.push(Value::Text(category.to_string()));
            where_clause_parts.push(format!("category = ?{}", query_parameters.len()));
        }

        if let Some(start_date) = self.start_date {
            query_parameters.push(Value::Text(start_date.to_string()));
            where_clause_parts.push(format!("date >= ?{}", query_parameters.len()));
        }

        if let Some(end_date) = self.end_date {
            query_parameters.push(Value::Text(end_date.to_string()));
            where_clause_parts.push(format!("date <= ?{}", query_parameters.len()));
        }

        if let Some(year) = self.year {
            query_parameters.push(Value::Integer(year.into()));
            where_clause_parts.push(format!("year = ?{}", query_parameters.len()));
        }

        if let Some(month) = self.month {
            query_parameters.push(Value::Integer(month.into()));
            where_clause_parts.push(format!("month = ?{}", query_parameters.len()));
        }

        (
            format!("WHERE {}", where_clause_parts.join(" AND ")),
            query_parameters,
        )
    }
}

/// The fields an expense list can be sorted by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseSortField {
    /// Sort in the order expenses were recorded.
    #[default]
    Unsorted,
    /// Sort by the date the money was spent.
    Date,
    /// Sort by amount.
    Amount,
    /// Sort by category name.
    Category,
    /// Sort by description.
    Description,
    /// Sort by when the expense was recorded.
    CreatedAt,
}

impl ExpenseSortField {
    fn order_by(&self) -> Option<&'static str> {
        match self {
            ExpenseSortField::Unsorted => None,
            ExpenseSortField::Date => Some("date"),
            ExpenseSortField::Amount => Some("CAST(amount AS REAL)"),
            ExpenseSortField::Category => Some("category"),
            ExpenseSortField::Description => Some("description"),
            ExpenseSortField::CreatedAt => Some("created_at"),
        }
    }
}

impl FromStr for ExpenseSortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(ExpenseSortField::Date),
            "amount" => Ok(ExpenseSortField::Amount),
            "category" => Ok(ExpenseSortField::Category),
            "description" => Ok(ExpenseSortField::Description),
            "createdAt" => Ok(ExpenseSortField::CreatedAt),
            other => Err(Error::Validation(format!(
                "sortBy must be one of date, amount, category, description or createdAt, got \"{other}\""
            ))),
        }
    }
}

/// Get every expense owned by `user_id` that matches `filter`, ordered by
/// date and then by ID.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (where_clause, query_parameters) = filter.where_clause(user_id);
    let query_string = format!("{SELECT_EXPENSE} {where_clause} ORDER BY date ASC, id ASC");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Get one page of the expenses owned by `user_id` that match `filter`.
///
/// Expenses with equal sort keys are ordered by ID so pages are stable.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn list_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    sort_by: ExpenseSortField,
    sort_order: SortOrder,
    pagination: Pagination,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (where_clause, query_parameters) = filter.where_clause(user_id);
    let order_clause = match sort_by.order_by() {
        Some(column) => format!(
            "ORDER BY {column} {order}, id {order}",
            order = sort_order.as_sql()
        ),
        None => "ORDER BY id ASC".to_owned(),
    };
    let query_string = format!(
        "{SELECT_EXPENSE} {where_clause} {order_clause} LIMIT {} OFFSET {}",
        pagination.limit,
        pagination.offset()
    );
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Count the expenses owned by `user_id` that match `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn count_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, query_parameters) = filter.where_clause(user_id);
    let query_string = format!("SELECT COUNT(id) FROM expense {where_clause}");
    let params = params_from_iter(query_parameters.iter());

    connection
        .query_row(&query_string, params, |row| row.get::<_, i64>(0))
        .map(|count| count as u64)
        .map_err(|error| error.into())
}
