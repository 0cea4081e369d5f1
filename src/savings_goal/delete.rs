//! Savings goal deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::UserID,
    db::lock_connection,
    savings_goal::{SavingsGoalId, delete_savings_goal},
};

/// The state needed for deleting a savings goal.
#[derive(Debug, Clone)]
pub struct DeleteGoalState {
    /// The database connection for managing savings goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle savings goal deletion.
pub async fn delete_savings_goal_endpoint(
    State(state): State<DeleteGoalState>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<SavingsGoalId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_savings_goal(goal_id, user_id, &connection)?;

    tracing::debug!("User {user_id} deleted savings goal {goal_id}.");

    Ok(Json(json!({ "message": "Savings goal deleted successfully" })))
}

#[cfg(test)]
mod delete_savings_goal_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{create_test_user, get_test_server, insert_goal, log_in_test_user},
    };

    #[tokio::test]
    async fn deletes_own_goal() {
        let (server, state) = get_test_server();
        let (user, token) = log_in_test_user(&state);
        let goal = insert_goal(&state.db_connection.lock().unwrap(), user.id, "300", 2024, 5);

        let response = server
            .delete(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Savings goal deleted successfully" }));

        server
            .get("/api/goals/2024/5")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_goal_is_not_found() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);
        let goal = {
            let connection = state.db_connection.lock().unwrap();
            let other = create_test_user(&connection);
            insert_goal(&connection, other.id, "300", 2024, 5)
        };

        let response = server
            .delete(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Savings goal not found" }));
    }
}
