//! Endpoints for reading a user's expenses.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    expense::{
        Category, Expense, ExpenseFilter, ExpenseId, ExpenseSortField, count_expenses, get_expense,
        list_expenses,
    },
    pagination::{Pagination, SortOrder},
    period::parse_optional_date,
};

/// The state needed for reading expenses.
#[derive(Debug, Clone)]
pub struct ExpensesState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the expense list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    /// Only list expenses in this category.
    pub category: Option<String>,
    /// Only list expenses on or after this date.
    pub start_date: Option<String>,
    /// Only list expenses on or before this date.
    pub end_date: Option<String>,
    /// The field to sort by.
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    pub sort_order: Option<String>,
    /// The maximum number of expenses per page.
    pub limit: Option<u32>,
    /// The 1-based page number.
    pub page: Option<u32>,
}

/// One page of expenses.
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    /// The expenses on this page.
    pub expenses: Vec<Expense>,
    /// The number of expenses matching the filters across all pages.
    pub total: u64,
    /// The page number.
    pub page: u32,
    /// The page size.
    pub limit: u32,
}

/// List the logged in user's expenses, filtered, sorted and paginated.
pub async fn list_expenses_endpoint(
    State(state): State<ExpensesState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, Error> {
    let category = match query.category.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(Category::from_str(raw)?),
        None => None,
    };
    let filter = ExpenseFilter {
        category,
        start_date: parse_optional_date(query.start_date.as_deref(), "startDate")?,
        end_date: parse_optional_date(query.end_date.as_deref(), "endDate")?,
        ..Default::default()
    };
    let sort_by = match query.sort_by.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => ExpenseSortField::from_str(raw)?,
        None => ExpenseSortField::default(),
    };
    let sort_order = SortOrder::from_param(query.sort_order.as_deref());
    let pagination = Pagination::new(query.page, query.limit)?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = list_expenses(
        user_id,
        &filter,
        sort_by,
        sort_order,
        pagination,
        &connection,
    )?;
    let total = count_expenses(user_id, &filter, &connection)?;

    Ok(Json(ExpenseListResponse {
        expenses,
        total,
        page: pagination.page,
        limit: pagination.limit,
    }))
}

/// Get one of the logged in user's expenses.
pub async fn get_expense_endpoint(
    State(state): State<ExpensesState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_expense(expense_id, user_id, &connection).map(Json)
}
