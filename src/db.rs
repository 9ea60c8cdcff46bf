//! Traits and setup for the application's SQLite database.

use rusqlite::{Connection, Row};

use crate::{Error, user::User};

/// Create the fixed application tables if they do not exist yet.
///
/// Only the user table is created up front; transaction partitions are
/// one table per calendar month and are created lazily by the store on
/// the first append to that month.
///
/// # Errors
/// Returns an [Error::SqlError] if a table cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    User::create_table(connection)?;

    Ok(())
}

/// A trait for adding a model's schema to the database.
pub trait CreateTable {
    /// Create the table for the model if it does not exist.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping a [rusqlite::Row] to a concrete Rust type.
pub trait MapRow {
    /// The type the row maps to.
    type ReturnType;

    /// Convert a row into [Self::ReturnType], reading from the first column.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an incompatible type.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into [Self::ReturnType], reading from the column at
    /// `offset`.
    ///
    /// # Errors
    /// Returns an error if a column is missing or has an incompatible type.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_user_table() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'user'",
                (),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }
}
