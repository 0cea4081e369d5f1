//! Expense and category types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, period::YearMonth};

/// The database ID of an expense.
pub type ExpenseId = i64;

/// The fixed set of spending categories.
///
/// The declaration order is the order categories are listed and iterated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, eating out and drinks.
    Food,
    /// Public transport, fuel and fares.
    Transport,
    /// Movies, games, concerts and subscriptions.
    Entertainment,
    /// Clothes, gadgets and other purchases.
    Shopping,
    /// Medical costs, pharmacy and fitness.
    Health,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Other,
    ];

    /// The category's name as stored and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "category must be one of Food, Transport, Entertainment, Shopping, Health or Other, got \"{s}\""
                ))
            })
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;

        Category::from_str(raw).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A dated, categorised amount of money spent by a user.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user who spent the money.
    pub user_id: UserID,
    /// How much was spent. Never negative.
    pub amount: Decimal,
    /// What the money was spent on.
    pub category: Category,
    /// An optional note about the expense.
    pub description: Option<String>,
    /// When the money was spent.
    pub date: Date,
    /// The year of `date`, stored for month queries.
    pub year: i32,
    /// The month of `date` (1-12), stored for month queries.
    pub month: u8,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(
        user_id: UserID,
        amount: Decimal,
        category: Category,
        date: Date,
    ) -> ExpenseBuilder {
        ExpenseBuilder {
            user_id,
            amount,
            category,
            description: None,
            date,
        }
    }

    /// The month the expense falls in.
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// The largest amount a single expense or savings goal may have.
///
/// Sums of capped amounts stay far inside the range of [Decimal].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// A builder for creating and replacing [Expense] records.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseBuilder {
    /// The owner of the expense.
    pub user_id: UserID,
    /// How much was spent.
    pub amount: Decimal,
    /// What the money was spent on.
    pub category: Category,
    /// An optional note. Blank notes are stored as no note.
    pub description: Option<String>,
    /// When the money was spent.
    pub date: Date,
}

impl ExpenseBuilder {
    /// Set the description for the expense.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .map(str::to_owned);
        self
    }

    /// Check the expense can be stored.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the amount is negative or above [MAX_AMOUNT].
    pub fn validate(&self) -> Result<(), Error> {
        if self.amount < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "amount must not be negative, got {}",
                self.amount
            )));
        }

        if self.amount > MAX_AMOUNT {
            return Err(Error::Validation(format!(
                "amount must be at most {MAX_AMOUNT}, got {}",
                self.amount
            )));
        }

        Ok(())
    }
}
