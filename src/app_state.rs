//! State shared between route handlers.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::cookie::DEFAULT_COOKIE_DURATION,
    db::initialize,
    session::Session,
    stores::{SqliteTransactionStore, SqliteUserStore},
};

/// The state of the application to be shared across axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The key for signing and encrypting the session cookie.
    cookie_key: Key,
    /// How long a session lasts without activity.
    cookie_duration: Duration,
    /// The app's database connection.
    db_connection: Arc<Mutex<Connection>>,
    /// The staged CSV imports of each logged-in user, keyed by username.
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl AppState {
    /// Create the application state, ensuring the database schema exists.
    ///
    /// `cookie_secret` is hashed into the cookie signing key, so any
    /// non-trivial string will do as long as it stays stable across
    /// restarts.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the database schema cannot be
    /// created.
    pub fn new(db_connection: Connection, cookie_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: Key::from(&Sha512::digest(cookie_secret)),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(db_connection)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Override the session duration. Mainly useful in tests.
    pub fn with_cookie_duration(mut self, duration: Duration) -> Self {
        self.cookie_duration = duration;
        self
    }

    /// How long a session cookie stays valid after it is issued.
    pub fn cookie_duration(&self) -> Duration {
        self.cookie_duration
    }

    /// A transaction store backed by the shared database connection.
    pub fn transaction_store(&self) -> SqliteTransactionStore {
        SqliteTransactionStore::new(self.db_connection.clone())
    }

    /// A user store backed by the shared database connection.
    pub fn user_store(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.db_connection.clone())
    }

    /// Lock and return the per-user import sessions.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the lock is poisoned.
    pub fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, Error> {
        self.sessions.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{
        session::Session,
        stores::UserStore,
        user::PasswordHash,
    };

    use super::AppState;

    #[test]
    fn new_creates_the_schema() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42").unwrap();

        // The user table exists, so inserting succeeds.
        let hash = PasswordHash::from_raw_password("hunter2", PasswordHash::MIN_COST).unwrap();
        state.user_store().create("alice", hash).unwrap();
    }

    #[test]
    fn stores_share_the_connection() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42").unwrap();

        let hash = PasswordHash::from_raw_password("hunter2", PasswordHash::MIN_COST).unwrap();
        state.user_store().create("alice", hash).unwrap();

        // A second store handle sees the same data.
        assert!(state.user_store().get("alice").is_ok());
    }

    #[test]
    fn sessions_start_empty_and_persist_across_clones() {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42").unwrap();

        state
            .sessions()
            .unwrap()
            .insert("alice".to_owned(), Session::new("alice"));

        let clone = state.clone();

        assert!(clone.sessions().unwrap().contains_key("alice"));
    }
}
