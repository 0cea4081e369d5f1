//! BudgetBloom is a web API for tracking personal finances.
//!
//! Users register and log in to receive a JSON Web Token, record their
//! expenses, set a savings goal for each month, and request analytics over
//! that data: category distributions, spending trends, period comparisons,
//! savings progress, spending summaries and generated insights.
//!
//! Every endpoint other than registration, log in and password reset is
//! guarded by [auth::auth_guard], and every query is scoped to the
//! authenticated user.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod analytics;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod expense;
mod logging;
mod pagination;
mod period;
mod routing;
mod savings_goal;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{NewUser, PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use db::initialize as initialize_db;
pub use expense::{Category, Expense, ExpenseBuilder, create_expense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use period::YearMonth;
pub use routing::{build_cors_layer, build_router};
pub use savings_goal::{NewSavingsGoal, SavingsGoal, upsert_savings_goal};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request parameter or body field was missing or invalid.
    ///
    /// The string explains which parameter was wrong and is shown to the client.
    #[error("{0}")]
    Validation(String),

    /// The email or password used to log in did not match a registered user.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The current password given when changing passwords was wrong.
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// The bearer token was missing, malformed, expired, or belongs to a
    /// user that no longer exists.
    #[error("Please authenticate")]
    InvalidToken,

    /// The JSON Web Token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string could not be parsed as an email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user has already registered with the email address.
    #[error("Email already in use")]
    DuplicateEmail,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The expense does not exist or belongs to another user.
    #[error("Expense not found")]
    ExpenseNotFound,

    /// The savings goal does not exist or belongs to another user.
    #[error("Savings goal not found")]
    SavingsGoalNotFound,

    /// No savings goal has been set for the month.
    #[error("No savings goal set for {year}-{month:02}")]
    NoSavingsGoal {
        /// The year that was queried.
        year: i32,
        /// The month that was queried (1-12).
        month: u8,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Stored amounts added up to more than a [rust_decimal::Decimal] can hold.
    #[error("the sum of the stored amounts overflowed")]
    AmountOverflow,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::IncorrectPassword
            | Error::TooWeak(_)
            | Error::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotFound
            | Error::ExpenseNotFound
            | Error::SavingsGoalNotFound
            | Error::NoSavingsGoal { .. } => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_)
            | Error::AmountOverflow => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server side errors are not intended to be shown to the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::Error;

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn error_kinds_map_to_distinct_statuses() {
        let cases = [
            (Error::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (Error::InvalidToken, StatusCode::UNAUTHORIZED),
            (Error::ExpenseNotFound, StatusCode::NOT_FOUND),
            (
                Error::NoSavingsGoal {
                    year: 2024,
                    month: 5,
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::DuplicateEmail, StatusCode::CONFLICT),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
            (Error::AmountOverflow, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want_status) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), want_status);
        }
    }

    #[test]
    fn no_savings_goal_message_pads_month() {
        let error = Error::NoSavingsGoal {
            year: 2024,
            month: 5,
        };

        assert_eq!(error.to_string(), "No savings goal set for 2024-05");
    }
}
