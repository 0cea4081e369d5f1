//! Expense editing endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    expense::{Expense, ExpenseId, create::ExpenseForm, get_expense, update_expense},
};

/// The state needed for editing an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace the amount, category, description and date of an expense.
///
/// A missing description clears the stored one, a missing date keeps the
/// stored date.
pub async fn edit_expense_endpoint(
    State(state): State<EditExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<ExpenseForm>,
) -> Result<Json<Expense>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let existing = get_expense(expense_id, user_id, &connection)?;
    let builder = form.into_builder(user_id, existing.date)?;

    let expense = update_expense(expense_id, builder, &connection)?;

    tracing::debug!("User {user_id} updated expense {expense_id}.");

    Ok(Json(expense))
}

#[cfg(test)]
mod edit_expense_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use time::macros::date;

    use crate::{
        endpoints::{self, format_endpoint},
        expense::{Category, get_expense},
        test_utils::{create_test_user, dec, get_test_server, insert_expense, log_in_test_user},
    };

    #[tokio::test]
    async fn edit_replaces_fields() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let expense = insert_expense(
            &state.db_connection.lock().unwrap(),
            user.id,
            "10",
            Category::Food,
            date!(2024 - 05 - 31),
        );

        let response = server
            .put(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .json(&json!({
                "amount": 15.25,
                "category": "Entertainment",
                "description": "Cinema",
                "date": "2024-06-01"
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["month"], 6);
        assert_eq!(body["category"], "Entertainment");

        let stored =
            get_expense(expense.id, user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(stored.amount, dec("15.25"));
        assert_eq!(stored.date, date!(2024 - 06 - 01));
        assert_eq!(stored.description.as_deref(), Some("Cinema"));
    }

    #[tokio::test]
    async fn missing_date_keeps_stored_date() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let expense = insert_expense(
            &state.db_connection.lock().unwrap(),
            user.id,
            "10",
            Category::Food,
            date!(2024 - 05 - 31),
        );

        let response = server
            .put(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .json(&json!({ "amount": 11, "category": "Food" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["date"], "2024-05-31");
    }

    #[tokio::test]
    async fn edit_other_users_expense_is_not_found() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);
        let expense = {
            let connection = state.db_connection.lock().unwrap();
            let other = create_test_user(&connection);
            insert_expense(&connection, other.id, "1", Category::Food, date!(2024 - 05 - 01))
        };

        let response = server
            .put(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .json(&json!({ "amount": 100, "category": "Food" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn edit_rejects_negative_amount() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let expense = insert_expense(
            &state.db_connection.lock().unwrap(),
            user.id,
            "10",
            Category::Food,
            date!(2024 - 05 - 31),
        );

        let response = server
            .put(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(token)
            .json(&json!({ "amount": -5, "category": "Food" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
