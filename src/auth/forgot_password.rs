//! Password reset requests.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{get_user_by_email, user::parse_email},
    db::lock_connection,
};

/// The message sent for every reset request, registered or not.
pub const PASSWORD_RESET_MESSAGE: &str =
    "If your email is registered, you will receive a password reset link.";

/// The state needed to look up the user requesting a reset.
#[derive(Clone)]
pub struct ForgotPasswordState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ForgotPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    /// The email the reset link should go to.
    pub email: String,
}

/// Accept a password reset request.
///
/// The response is the same whether or not the email is registered so that
/// the endpoint cannot be used to discover accounts. Reset emails are not
/// sent yet; the lookup is only logged.
pub async fn request_password_reset(
    State(state): State<ForgotPasswordState>,
    Json(form): Json<ForgotPasswordForm>,
) -> Json<Value> {
    let lookup = parse_email(&form.email).and_then(|email| {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_email(&email, &connection)
    });

    match lookup {
        Ok(user) => tracing::info!("Password reset requested for user {}.", user.id),
        Err(Error::NotFound | Error::InvalidEmail(_)) => {
            tracing::info!("Password reset requested for an unregistered email.")
        }
        Err(error) => tracing::error!("Could not look up user for password reset: {error}"),
    }

    Json(json!({ "message": PASSWORD_RESET_MESSAGE }))
}

#[cfg(test)]
mod forgot_password_tests {
    use serde_json::json;

    use crate::{
        auth::forgot_password::PASSWORD_RESET_MESSAGE,
        endpoints,
        test_utils::{create_test_user_with_password, get_test_server},
    };

    #[tokio::test]
    async fn registered_and_unregistered_emails_get_same_response() {
        let (server, state) = get_test_server();
        let user = create_test_user_with_password(&state);

        let registered = server
            .post(endpoints::FORGOT_PASSWORD)
            .json(&json!({ "email": user.email }))
            .await;
        let unregistered = server
            .post(endpoints::FORGOT_PASSWORD)
            .json(&json!({ "email": "nobody@example.com" }))
            .await;

        registered.assert_status_ok();
        unregistered.assert_status_ok();
        registered.assert_json(&json!({ "message": PASSWORD_RESET_MESSAGE }));
        unregistered.assert_json(&json!({ "message": PASSWORD_RESET_MESSAGE }));
    }
}
