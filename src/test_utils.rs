#![allow(missing_docs)]

use std::{
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use axum_test::TestServer;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime};

use crate::{
    AppState, build_router,
    auth::{
        NewUser, PasswordHash, User, UserID, ValidatedPassword, create_user, encode_token,
        parse_email,
    },
    db::initialize,
    expense::{Category, Expense, create_expense},
    period::YearMonth,
    savings_goal::{NewSavingsGoal, SavingsGoal, upsert_savings_goal},
};

/// The password of users created with [create_test_user_with_password].
pub(crate) const TEST_PASSWORD: &str = "Wq7!tR9#mZ2$kP";

static NEXT_USER: AtomicU32 = AtomicU32::new(1);

pub(crate) fn dec(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("Could not parse decimal")
}

pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");

    connection
}

/// Insert a user with a unique email and a placeholder password hash.
pub(crate) fn create_test_user(connection: &Connection) -> User {
    insert_user(PasswordHash::new_unchecked("hunter2"), connection)
}

fn insert_user(password_hash: PasswordHash, connection: &Connection) -> User {
    let n = NEXT_USER.fetch_add(1, Ordering::Relaxed);

    create_user(
        NewUser {
            email: parse_email(&format!("test{n}@example.com")).expect("Invalid test email"),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            password_hash,
        },
        OffsetDateTime::now_utc(),
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let state = AppState::new(connection, "test secret", "Etc/UTC")
        .expect("Could not create app state")
        .with_password_cost(4);
    let server =
        TestServer::new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

/// Insert a user whose password is [TEST_PASSWORD].
pub(crate) fn create_test_user_with_password(state: &AppState) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        state.password_cost,
    )
    .expect("Could not hash password");
    let connection = state.db_connection.lock().unwrap();

    insert_user(password_hash, &connection)
}

/// Insert a user and sign a bearer token for them.
pub(crate) fn log_in_test_user(state: &AppState) -> (User, String) {
    let user = create_test_user_with_password(state);
    let token = encode_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.token_keys,
    )
    .expect("Could not create token");

    (user, token)
}

pub(crate) fn insert_expense(
    connection: &Connection,
    user_id: UserID,
    amount: &str,
    category: Category,
    date: Date,
) -> Expense {
    create_expense(Expense::build(user_id, dec(amount), category, date), connection)
        .expect("Could not create test expense")
}

/// Insert an expense row directly, skipping the amount checks in [create_expense].
pub(crate) fn insert_unchecked_expense(
    connection: &Connection,
    user_id: UserID,
    amount: Decimal,
    category: Category,
    date: Date,
) {
    let period = YearMonth::from_date(date);
    let now = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO expense
                (user_id, amount, category, date, year, month, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            (
                user_id.as_i64(),
                amount.to_string(),
                category,
                date,
                period.year,
                period.month,
                now,
            ),
        )
        .expect("Could not insert test expense");
}

pub(crate) fn insert_goal(
    connection: &Connection,
    user_id: UserID,
    target_amount: &str,
    year: i32,
    month: u8,
) -> SavingsGoal {
    let period = YearMonth::new(year, month).expect("Invalid test month");
    let new_goal =
        NewSavingsGoal::new(user_id, dec(target_amount), period).expect("Invalid test goal");

    upsert_savings_goal(new_goal, connection)
        .expect("Could not create test goal")
        .goal()
        .clone()
}
