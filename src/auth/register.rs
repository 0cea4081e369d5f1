//! Registration of new users.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{
        NewUser, PasswordHash, TokenKeys, User, ValidatedPassword, create_user, encode_token,
        user::{parse_email, parse_name},
    },
    db::lock_connection,
};

/// The state needed to register a user and issue their first token.
#[derive(Clone)]
pub struct RegistrationState {
    /// The keys used to sign tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The bcrypt cost for hashing the new password.
    pub password_cost: u32,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for registering a user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The email the user will log in with.
    pub email: String,
    /// The plain text password.
    pub password: String,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
}

/// A user together with a freshly signed token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The authenticated user.
    pub user: User,
    /// A bearer token for the user.
    pub token: String,
}

/// A route handler for registering a new user.
///
/// Responds with 201 and the new user plus a token, or 409 if the email is
/// already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let email = parse_email(&form.email)?;
    let first_name = parse_name(&form.first_name, "firstName")?;
    let last_name = parse_name(&form.last_name, "lastName")?;

    let password = ValidatedPassword::new(
        &form.password,
        &[email.as_str(), first_name.as_str(), last_name.as_str()],
    )?;
    let password_hash = PasswordHash::new(password, state.password_cost)?;

    let now = OffsetDateTime::now_utc();
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        create_user(
            NewUser {
                email,
                first_name,
                last_name,
                password_hash,
            },
            now,
            &connection,
        )?
    };

    tracing::info!("Registered user {}.", user.id);

    let token = encode_token(user.id, now, state.token_duration, &state.token_keys)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}
