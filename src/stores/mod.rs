//! Traits and implementations for persisting the domain models.

mod sqlite;

pub use sqlite::{SqliteTransactionStore, SqliteUserStore};

use crate::{
    Error,
    period::PeriodKey,
    transaction::Transaction,
    user::{PasswordHash, User},
};

/// Append-only persistence for transactions, partitioned by calendar month.
pub trait TransactionStore {
    /// Append `transactions` to the partition identified by `period`,
    /// creating the partition if it does not exist yet.
    ///
    /// The whole batch is written atomically: a concurrent reader sees
    /// either none of it or all of it. Returns the number of rows written.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the partition cannot be opened or
    /// written. Failures are surfaced to the caller, never retried here.
    fn append(&mut self, period: &PeriodKey, transactions: &[Transaction])
    -> Result<usize, Error>;

    /// Every record in the partition identified by `period`, in storage
    /// order.
    ///
    /// # Errors
    /// Returns [Error::PartitionNotFound] if the partition does not exist.
    /// Whether that is an error or an empty-result case is the caller's
    /// decision.
    fn read_partition(&self, period: &PeriodKey) -> Result<Vec<Transaction>, Error>;

    /// Every record across all partitions, partitions visited in
    /// chronological order.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the storage cannot be read.
    fn read_all(&self) -> Result<Vec<Transaction>, Error>;

    /// The existing partitions in chronological order.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the storage cannot be read.
    fn partitions(&self) -> Result<Vec<PeriodKey>, Error>;
}

/// Handles the creation and retrieval of user accounts.
pub trait UserStore {
    /// Create a new user with the given password hash.
    ///
    /// # Errors
    /// Returns [Error::DuplicateUsername] if the username is taken and
    /// [Error::EmptyUsername] if it is blank.
    fn create(&mut self, username: &str, password_hash: PasswordHash) -> Result<User, Error>;

    /// Retrieve the user with `username`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no such user exists.
    fn get(&self, username: &str) -> Result<User, Error>;
}
