//! The user account model and password hashing.

use std::fmt::Display;

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
};

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// An alias for the default cost for hashing passwords.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// The lowest cost bcrypt accepts. Hashing at this cost is fast but
    /// easy to brute-force, only use it in tests.
    pub const MIN_COST: u32 = 4;

    /// Hash a raw password with the specified `cost`.
    ///
    /// `cost` increases the rounds of hashing and therefore the time needed
    /// to verify a password. Pass [PasswordHash::DEFAULT_COST] unless you
    /// are hashing in tests.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the underlying hashing library fails.
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(raw_password, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string without validating it.
    ///
    /// The caller should ensure that `raw_password_hash` came out of a
    /// bcrypt hashing routine; an invalid hash will fail every
    /// verification but is not unsafe.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check whether `raw_password` matches the stored hash.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the hash string is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }

    /// The hash string, for storage.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    // The hash leaks information about the password, keep it out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    username: String,
    password_hash: PasswordHash,
}

impl User {
    /// Create a user value. Does not persist anything; see
    /// [UserStore::create](crate::stores::UserStore::create).
    pub fn new(username: &str, password_hash: PasswordHash) -> Self {
        Self {
            username: username.to_owned(),
            password_hash,
        }
    }

    /// The name the user logs in with.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The user's hashed password.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

impl CreateTable for User {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                username TEXT PRIMARY KEY,
                password TEXT NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for User {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        let password: String = row.get(offset + 1)?;

        Ok(Self {
            username: row.get(offset)?,
            password_hash: PasswordHash::new_unchecked(&password),
        })
    }
}
