//! Database setup and helpers shared by the stores.

use std::{
    str::FromStr,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{Connection, Row, Transaction, TransactionBehavior, types::Type};
use rust_decimal::Decimal;

use crate::{
    Error, auth::create_user_table, expense::create_expense_table,
    savings_goal::create_savings_goal_table,
};

/// Create all of the application's tables.
///
/// Foreign key enforcement is switched on for `connection` so that expenses
/// and savings goals can only reference registered users.
///
/// # Errors
/// Returns an error if a table could not be created or the transaction failed.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_expense_table(&transaction)?;
    create_savings_goal_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the mutex has been poisoned.
pub fn lock_connection(
    connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Read a decimal stored as TEXT from column `index` of `row`.
pub fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let raw: String = row.get(index)?;

    Decimal::from_str(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::db::{get_decimal, initialize};

    #[test]
    fn initialize_creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                WHERE type = 'table' AND name IN ('user', 'expense', 'savings_goal')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 3);
    }

    #[test]
    fn initialize_twice_succeeds() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        assert!(initialize(&connection).is_ok());
    }

    #[test]
    fn initialize_enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn reads_decimal_text_exactly() {
        let connection = Connection::open_in_memory().unwrap();

        let amount = connection
            .query_row("SELECT '0.10'", [], |row| get_decimal(row, 0))
            .unwrap();

        assert_eq!(amount, Decimal::new(10, 2));
    }

    #[test]
    fn rejects_non_decimal_text() {
        let connection = Connection::open_in_memory().unwrap();

        let result = connection.query_row("SELECT 'lots'", [], |row| get_decimal(row, 0));

        assert!(result.is_err());
    }
}
