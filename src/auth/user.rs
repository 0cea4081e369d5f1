//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, lowercased.
    pub email: String,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The user's password hash. Never sent to clients.
    #[serde(skip)]
    pub password_hash: PasswordHash,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The details needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// A validated, lowercased email address.
    pub email: EmailAddress,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
}

/// Parse an email address, trimming whitespace and lowercasing it.
///
/// # Errors
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let normalized = raw_email.trim().to_lowercase();

    EmailAddress::from_str(&normalized).map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// Trim a name and check that it is not empty.
///
/// # Errors
/// Returns [Error::Validation] naming `field` if the name is blank.
pub fn parse_name(raw_name: &str, field: &str) -> Result<String, Error> {
    let name = raw_name.trim();

    if name.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }

    Ok(name.to_owned())
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateEmail] if the email is already registered, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    new_user: NewUser,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, first_name, last_name, password, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_user.email.as_str(),
            &new_user.first_name,
            &new_user.last_name,
            new_user.password_hash.as_ref(),
            created_at,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: new_user.email.to_string(),
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        password_hash: new_user.password_hash,
        created_at,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: row.get(5)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, first_name, last_name, password, created_at
            FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has registered with the email, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, first_name, last_name, password, created_at
            FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", email.as_str())], map_user_row)
        .map_err(|error| error.into())
}

/// Change the name of the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_user_name(
    user_id: UserID,
    first_name: &str,
    last_name: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET first_name = ?1, last_name = ?2 WHERE id = ?3",
        (first_name, last_name, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Replace the password hash of the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::{
            PasswordHash,
            user::{
                NewUser, UserID, create_user, create_user_table, get_user_by_email,
                get_user_by_id, parse_email, parse_name, update_password, update_user_name,
            },
        },
    };

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: parse_email(email).unwrap(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let connection = get_db_connection();
        let created_at = datetime!(2024-05-01 09:30 UTC);

        let inserted_user = create_user(new_user("ada@example.com"), created_at, &connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "ada@example.com");
        assert_eq!(inserted_user.created_at, created_at);
    }

    #[test]
    fn insert_duplicate_email_fails() {
        let connection = get_db_connection();
        let created_at = datetime!(2024-05-01 09:30 UTC);
        create_user(new_user("ada@example.com"), created_at, &connection).unwrap();

        let result = create_user(new_user("ada@example.com"), created_at, &connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_by_id_and_email_return_inserted_user() {
        let connection = get_db_connection();
        let test_user = create_user(
            new_user("ada@example.com"),
            datetime!(2024-05-01 09:30 UTC),
            &connection,
        )
        .unwrap();

        assert_eq!(get_user_by_id(test_user.id, &connection), Ok(test_user.clone()));
        assert_eq!(
            get_user_by_email(&parse_email("ADA@example.com ").unwrap(), &connection),
            Ok(test_user)
        );
    }

    #[test]
    fn update_name_changes_only_name() {
        let connection = get_db_connection();
        let test_user = create_user(
            new_user("ada@example.com"),
            datetime!(2024-05-01 09:30 UTC),
            &connection,
        )
        .unwrap();

        let updated = update_user_name(test_user.id, "Augusta", "King", &connection).unwrap();

        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.last_name, "King");
        assert_eq!(updated.email, test_user.email);
    }

    #[test]
    fn update_password_for_missing_user_is_not_found() {
        let connection = get_db_connection();

        let result = update_password(
            UserID::new(7),
            &PasswordHash::new_unchecked("hash"),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn serialized_user_omits_password() {
        let connection = get_db_connection();
        let test_user = create_user(
            new_user("ada@example.com"),
            datetime!(2024-05-01 09:30 UTC),
            &connection,
        )
        .unwrap();

        let json = serde_json::to_value(&test_user).unwrap();

        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["createdAt"], "2024-05-01T09:30:00Z");
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn parse_email_rejects_garbage() {
        assert!(matches!(parse_email("not an email"), Err(Error::InvalidEmail(_))));
    }

    #[test]
    fn parse_name_rejects_blank() {
        assert!(matches!(parse_name("   ", "firstName"), Err(Error::Validation(_))));
        assert_eq!(parse_name(" Ada ", "firstName"), Ok("Ada".to_owned()));
    }
}
