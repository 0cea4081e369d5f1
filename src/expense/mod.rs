//! Expenses: dated, categorised amounts of money spent by a user.

mod calendar;
mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use calendar::{get_expense_calendar, get_monthly_summary};
pub use create::create_expense_endpoint;
pub use db::{
    ExpenseFilter, ExpenseSortField, count_expenses, create_expense, create_expense_table,
    delete_expense, get_expense, get_expenses, list_expenses, update_expense,
};
pub use delete::delete_expense_endpoint;
pub use domain::{Category, Expense, ExpenseBuilder, ExpenseId, MAX_AMOUNT};
pub use edit::edit_expense_endpoint;
pub use list::{get_expense_endpoint, list_expenses_endpoint};
