//! Expense creation endpoint and the request body shared with editing.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    expense::{Category, Expense, ExpenseBuilder, create_expense},
    period::parse_optional_date,
    timezone::local_today,
};

/// The state needed for creating an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or replacing an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseForm {
    /// How much was spent.
    pub amount: Decimal,
    /// The category name, e.g. "Food".
    pub category: String,
    /// An optional note.
    pub description: Option<String>,
    /// The date the money was spent as "YYYY-MM-DD" or a full timestamp.
    pub date: Option<String>,
}

impl ExpenseForm {
    /// Validate the form and turn it into a builder owned by `user_id`.
    ///
    /// `default_date` is used when the form has no date.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the category or date are invalid or the
    /// amount is negative or too large.
    pub fn into_builder(
        self,
        user_id: UserID,
        default_date: Date,
    ) -> Result<ExpenseBuilder, Error> {
        let category = Category::from_str(self.category.trim())?;
        let date = parse_optional_date(self.date.as_deref(), "date")?.unwrap_or(default_date);

        let builder = Expense::build(user_id, self.amount, category, date)
            .description(self.description.as_deref());
        builder.validate()?;

        Ok(builder)
    }
}

/// A route handler for creating a new expense for the logged in user.
///
/// The expense is dated today in the server's timezone if no date is given.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<ExpenseForm>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let today = local_today(&state.local_timezone)?;
    let builder = form.into_builder(user_id, today)?;

    let connection = lock_connection(&state.db_connection)?;
    let expense = create_expense(builder, &connection)?;

    tracing::debug!("User {user_id} created expense {}.", expense.id);

    Ok((StatusCode::CREATED, Json(expense)))
}

#[cfg(test)]
mod create_expense_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        expense::{ExpenseFilter, get_expenses},
        test_utils::{dec, get_test_server, log_in_test_user},
        timezone::local_today,
    };

    #[tokio::test]
    async fn create_expense_succeeds() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({
                "amount": 42.5,
                "category": "Food",
                "description": "Groceries",
                "date": "2024-05-17"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["amount"], json!(42.5));
        assert_eq!(body["category"], "Food");
        assert_eq!(body["description"], "Groceries");
        assert_eq!(body["date"], "2024-05-17");
        assert_eq!(body["year"], 2024);
        assert_eq!(body["month"], 5);
        assert_eq!(body["userId"], user.id.as_i64());

        let stored = get_expenses(
            user.id,
            &ExpenseFilter::default(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, dec("42.5"));
    }

    #[tokio::test]
    async fn date_defaults_to_today() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({ "amount": 3, "category": "Transport" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let today = local_today("Etc/UTC").unwrap();
        assert_eq!(response.json::<Value>()["date"], today.to_string());
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({ "amount": -1, "category": "Food", "date": "2024-05-17" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_amount_is_rejected() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);

        for _ in 0..2 {
            server
                .post(endpoints::EXPENSES)
                .authorization_bearer(&token)
                .json(&json!({ "amount": 5e28, "category": "Food", "date": "2024-05-17" }))
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }

        let stored = get_expenses(
            user.id,
            &ExpenseFilter::default(),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();
        assert!(stored.is_empty());
        server
            .get(endpoints::CATEGORY_DISTRIBUTION)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({ "amount": 1, "category": "Gambling" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn requires_token() {
        let (server, _) = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({ "amount": 1, "category": "Food" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
