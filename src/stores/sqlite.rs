//! SQLite-backed implementations of the store traits.
//!
//! Transactions live in one table per period partition
//! (e.g. `transaction_2024_07`), mirroring the month-per-file layout of
//! the data this application manages. Partition tables are created
//! lazily on the first append.

use std::sync::{Arc, Mutex};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::{
    Error,
    db::MapRow,
    period::PeriodKey,
    stores::{TransactionStore, UserStore},
    transaction::{Class, Transaction},
    user::{PasswordHash, User},
};

impl ToSql for Class {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Class {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Class>()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// The name of the SQLite table holding the given period partition.
fn table_name(period: &PeriodKey) -> String {
    format!("transaction_{:04}_{:02}", period.year(), period.month())
}

/// The period key encoded in a partition table name, if it is one.
fn period_from_table_name(name: &str) -> Option<PeriodKey> {
    let (year, month) = name.strip_prefix("transaction_")?.split_once('_')?;

    PeriodKey::new(year.parse().ok()?, month.parse().ok()?).ok()
}

/// Stores transactions in a SQLite database, one table per period.
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SqliteTransactionStore {
    /// Append `transactions` to the partition for `period` inside a single
    /// SQL transaction, creating the partition table if needed.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the table cannot be created or
    /// written, and [Error::DatabaseLockError] if the connection lock is
    /// poisoned. Nothing is written unless everything is.
    fn append(
        &mut self,
        period: &PeriodKey,
        transactions: &[Transaction],
    ) -> Result<usize, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let table = table_name(period);
        let tx = connection.unchecked_transaction()?;

        tx.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    id INTEGER PRIMARY KEY,
                    date TEXT NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT NOT NULL,
                    amount REAL NOT NULL,
                    class TEXT NOT NULL
                )"
            ),
            (),
        )?;

        {
            let mut statement = tx.prepare(&format!(
                "INSERT INTO \"{table}\" (date, category, description, amount, class)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))?;

            for transaction in transactions {
                statement.execute((
                    transaction.date,
                    &transaction.category,
                    &transaction.description,
                    transaction.amount,
                    transaction.class,
                ))?;
            }
        }

        tx.commit()?;

        Ok(transactions.len())
    }

    fn read_partition(&self, period: &PeriodKey) -> Result<Vec<Transaction>, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        read_partition_rows(&connection, period)
    }

    fn read_all(&self) -> Result<Vec<Transaction>, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let mut transactions = Vec::new();

        for period in list_partitions(&connection)? {
            transactions.extend(read_partition_rows(&connection, &period)?);
        }

        Ok(transactions)
    }

    fn partitions(&self) -> Result<Vec<PeriodKey>, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        list_partitions(&connection)
    }
}

fn read_partition_rows(
    connection: &Connection,
    period: &PeriodKey,
) -> Result<Vec<Transaction>, Error> {
    let table = table_name(period);

    if !table_exists(connection, &table)? {
        return Err(Error::PartitionNotFound(period.to_string()));
    }

    connection
        .prepare(&format!(
            "SELECT date, category, description, amount, class FROM \"{table}\" ORDER BY id"
        ))?
        .query_map((), map_transaction_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        date: row.get(0)?,
        category: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        class: row.get(4)?,
    })
}

fn table_exists(connection: &Connection, name: &str) -> Result<bool, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// The partition tables in the database in chronological order.
///
/// Zero-padded table names sort chronologically, so the name ordering from
/// SQLite is reused as-is.
fn list_partitions(connection: &Connection) -> Result<Vec<PeriodKey>, Error> {
    let names: Vec<String> = connection
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name LIKE 'transaction\\_%' ESCAPE '\\'
             ORDER BY name",
        )?
        .query_map((), |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    Ok(names
        .iter()
        .filter_map(|name| {
            let period = period_from_table_name(name);

            if period.is_none() {
                tracing::warn!("ignoring table '{name}' that is not a valid partition");
            }

            period
        })
        .collect())
}

/// Stores user accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl UserStore for SqliteUserStore {
    fn create(&mut self, username: &str, password_hash: PasswordHash) -> Result<User, Error> {
        if username.trim().is_empty() {
            return Err(Error::EmptyUsername);
        }

        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        connection
            .execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username, password_hash.as_str()),
            )
            .map_err(|error| match error {
                // Codes 1555 and 2067 occur when a PRIMARY KEY or UNIQUE
                // constraint failed: the username is already taken.
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 1555 || sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateUsername(username.to_owned())
                }
                error => error.into(),
            })?;

        Ok(User::new(username, password_hash))
    }

    fn get(&self, username: &str) -> Result<User, Error> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let user = connection
            .prepare("SELECT username, password FROM user WHERE username = ?1")?
            .query_row([username], User::map_row)?;

        Ok(user)
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error,
        db::initialize,
        period::PeriodKey,
        stores::TransactionStore,
        transaction::{Class, Transaction},
    };

    use super::SqliteTransactionStore;

    fn get_store() -> SqliteTransactionStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteTransactionStore::new(Arc::new(Mutex::new(connection)))
    }

    fn transaction(date: Date, category: &str, amount: f64, class: Class) -> Transaction {
        Transaction::new(
            date,
            category.to_owned(),
            "test entry".to_owned(),
            amount,
            class,
        )
        .unwrap()
    }

    #[test]
    fn append_then_read_partition_returns_the_records() {
        let mut store = get_store();
        let period: PeriodKey = "2024-07".parse().unwrap();
        let expected = vec![
            transaction(date!(2024 - 07 - 01), "Food", 12.50, Class::Expense),
            transaction(date!(2024 - 07 - 15), "Salary", 2500.0, Class::Income),
        ];

        let written = store.append(&period, &expected).unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.read_partition(&period).unwrap(), expected);
    }

    #[test]
    fn append_is_cumulative_and_keeps_duplicates() {
        let mut store = get_store();
        let period: PeriodKey = "2024-07".parse().unwrap();
        let record = vec![transaction(
            date!(2024 - 07 - 01),
            "Food",
            12.50,
            Class::Expense,
        )];

        store.append(&period, &record).unwrap();
        store.append(&period, &record).unwrap();

        let rows = store.read_partition(&period).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], rows[1]);
    }

    #[test]
    fn read_missing_partition_fails() {
        let store = get_store();
        let period: PeriodKey = "1999-01".parse().unwrap();

        let result = store.read_partition(&period);

        assert_eq!(result, Err(Error::PartitionNotFound("1999-01".to_owned())));
    }

    #[test]
    fn read_all_spans_partitions_in_chronological_order() {
        let mut store = get_store();
        let july: PeriodKey = "2024-07".parse().unwrap();
        let december: PeriodKey = "2023-12".parse().unwrap();

        store
            .append(
                &july,
                &[transaction(date!(2024 - 07 - 01), "Food", 1.0, Class::Expense)],
            )
            .unwrap();
        store
            .append(
                &december,
                &[transaction(
                    date!(2023 - 12 - 24),
                    "Gifts",
                    2.0,
                    Class::Expense,
                )],
            )
            .unwrap();

        let all = store.read_all().unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].category, "Gifts");
        assert_eq!(all[1].category, "Food");
    }

    #[test]
    fn partitions_lists_appended_months() {
        let mut store = get_store();

        assert_eq!(store.partitions().unwrap(), vec![]);

        for period_string in ["2024-07", "2023-12", "2024-01"] {
            let period: PeriodKey = period_string.parse().unwrap();
            store
                .append(
                    &period,
                    &[transaction(date!(2024 - 01 - 01), "Misc", 1.0, Class::Expense)],
                )
                .unwrap();
        }

        let strings: Vec<String> = store
            .partitions()
            .unwrap()
            .iter()
            .map(PeriodKey::to_string)
            .collect();
        assert_eq!(strings, vec!["2023-12", "2024-01", "2024-07"]);
    }

    #[test]
    fn append_empty_batch_creates_the_partition() {
        let mut store = get_store();
        let period: PeriodKey = "2024-07".parse().unwrap();

        store.append(&period, &[]).unwrap();

        assert_eq!(store.read_partition(&period).unwrap(), vec![]);
    }
}

#[cfg(test)]
mod sqlite_user_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{Error, db::initialize, stores::UserStore, user::PasswordHash};

    use super::SqliteUserStore;

    fn get_store() -> SqliteUserStore {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        SqliteUserStore::new(Arc::new(Mutex::new(connection)))
    }

    fn test_hash() -> PasswordHash {
        PasswordHash::from_raw_password("averysecurepassword", PasswordHash::MIN_COST).unwrap()
    }

    #[test]
    fn create_then_get_round_trips() {
        let mut store = get_store();

        let created = store.create("alice", test_hash()).unwrap();
        let fetched = store.get("alice").unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.username(), "alice");
    }

    #[test]
    fn create_rejects_duplicate_username() {
        let mut store = get_store();
        store.create("alice", test_hash()).unwrap();

        let result = store.create("alice", test_hash());

        assert_eq!(result, Err(Error::DuplicateUsername("alice".to_owned())));
    }

    #[test]
    fn create_rejects_blank_username() {
        let mut store = get_store();

        let result = store.create("  ", test_hash());

        assert_eq!(result, Err(Error::EmptyUsername));
    }

    #[test]
    fn get_unknown_user_fails() {
        let store = get_store();

        let result = store.get("nobody");

        assert_eq!(result, Err(Error::NotFound));
    }
}
