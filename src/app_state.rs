//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_TOKEN_DURATION, PasswordHash, TokenKeys},
    db::initialize,
    timezone::local_today,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The keys used to sign and verify JSON Web Tokens.
    pub token_keys: TokenKeys,

    /// How long a newly issued token is valid for.
    pub token_duration: Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if `local_timezone` is not a known timezone or the
    /// database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        local_today(local_timezone)?;
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            token_keys: TokenKeys::from_secret(jwt_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_cost: PasswordHash::DEFAULT_COST,
            local_timezone: local_timezone.to_owned(),
            db_connection: connection,
        })
    }

    /// Use `cost` when hashing new passwords.
    ///
    /// Tests use the minimum cost of 4 to keep them fast.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{AppState, Error};

    #[test]
    fn rejects_unknown_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(connection, "secret", "Mars/Olympus_Mons");

        assert!(matches!(result, Err(Error::InvalidTimezoneError(_))));
    }
}
