//! Route handlers for the logged in user's own account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    AppState, Error,
    auth::{
        PasswordHash, User, UserID, ValidatedPassword, get_user_by_id, update_password,
        update_user_name, user::parse_name,
    },
    db::lock_connection,
};

/// The keys a client may change with a profile update.
const ALLOWED_PROFILE_UPDATES: [&str; 2] = ["firstName", "lastName"];

/// The state needed for account handlers.
#[derive(Clone)]
pub struct AccountState {
    /// The bcrypt cost for hashing a new password.
    pub password_cost: u32,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Get the logged in user.
pub async fn get_current_user(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_user_by_id(user_id, &connection).map(Json)
}

/// Update the logged in user's first and/or last name.
///
/// Any key other than `firstName` and `lastName` rejects the whole update.
pub async fn update_profile(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(updates): Json<Map<String, Value>>,
) -> Result<Json<User>, Error> {
    if updates
        .keys()
        .any(|key| !ALLOWED_PROFILE_UPDATES.contains(&key.as_str()))
    {
        return Err(Error::Validation("Invalid updates!".to_owned()));
    }

    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(user_id, &connection)?;

    let first_name = match updates.get("firstName") {
        Some(value) => parse_name(string_value(value, "firstName")?, "firstName")?,
        None => user.first_name,
    };
    let last_name = match updates.get("lastName") {
        Some(value) => parse_name(string_value(value, "lastName")?, "lastName")?,
        None => user.last_name,
    };

    update_user_name(user_id, &first_name, &last_name, &connection).map(Json)
}

fn string_value<'a>(value: &'a Value, field: &str) -> Result<&'a str, Error> {
    value
        .as_str()
        .ok_or_else(|| Error::Validation(format!("{field} must be a string")))
}

/// The request body for changing passwords.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    /// The user's password before the change.
    pub current_password: String,
    /// The password to change to.
    pub new_password: String,
}

/// Change the logged in user's password after checking their current one.
pub async fn change_password(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<ChangePasswordForm>,
) -> Result<Json<Value>, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        get_user_by_id(user_id, &connection)?
    };

    if !user.password_hash.verify(&form.current_password)? {
        return Err(Error::IncorrectPassword);
    }

    let new_password = ValidatedPassword::new(
        &form.new_password,
        &[user.email.as_str(), user.first_name.as_str(), user.last_name.as_str()],
    )?;
    let password_hash = PasswordHash::new(new_password, state.password_cost)?;

    {
        let connection = lock_connection(&state.db_connection)?;
        update_password(user_id, &password_hash, &connection)?;
    }

    tracing::info!("User {user_id} changed their password.");

    Ok(Json(json!({ "message": "Password updated successfully" })))
}
