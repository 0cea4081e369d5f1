//! Log-out route handler.

use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::auth::UserID;

/// Acknowledge a log out.
///
/// Tokens are stateless, so the client logs out by discarding its token.
pub async fn post_log_out(Extension(user_id): Extension<UserID>) -> Json<Value> {
    tracing::info!("User {user_id} logged out.");

    Json(json!({ "message": "Logged out successfully" }))
}

#[cfg(test)]
mod log_out_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        endpoints,
        test_utils::{get_test_server, log_in_test_user},
    };

    #[tokio::test]
    async fn log_out_returns_message() {
        let (server, state) = get_test_server();
        let (_, token) = log_in_test_user(&state);

        let response = server.post(endpoints::LOG_OUT).authorization_bearer(token).await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Logged out successfully" }));
    }

    #[tokio::test]
    async fn log_out_requires_token() {
        let (server, _) = get_test_server();

        server
            .post(endpoints::LOG_OUT)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
