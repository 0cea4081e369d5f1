//! Handles log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        TokenKeys, encode_token, get_user_by_email, register::AuthResponse, user::parse_email,
    },
    db::lock_connection,
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The keys used to sign tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered by the user.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered or the
/// password is wrong. Both cases give the same response so that clients
/// cannot probe for registered emails.
pub async fn post_log_in(
    State(state): State<LoginState>,
    Json(credentials): Json<LogInData>,
) -> Result<Json<AuthResponse>, Error> {
    let email = parse_email(&credentials.email).map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&credentials.password)? {
        return Err(Error::InvalidCredentials);
    }

    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.token_keys,
    )?;

    Ok(Json(AuthResponse { user, token }))
}
