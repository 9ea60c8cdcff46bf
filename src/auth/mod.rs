//! Credential verification and cookie-based session handling.

pub mod cookie;
pub mod middleware;

use crate::{Error, stores::UserStore};

/// Checks a username/password pair against some credential source.
///
/// The HTTP layer only depends on this trait, so the credential source can
/// be swapped without touching the log-in handler.
pub trait CredentialVerifier {
    /// Verify that `password` is the password of `username`.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] if the user does not exist or
    /// the password does not match. An unknown user and a wrong password
    /// are deliberately indistinguishable to the caller.
    fn verify(&self, username: &str, password: &str) -> Result<(), Error>;
}

/// Verifies credentials against the hashed passwords in a [UserStore].
pub struct StoreCredentialVerifier<S> {
    store: S,
}

impl<S: UserStore> StoreCredentialVerifier<S> {
    /// Create a verifier backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: UserStore> CredentialVerifier for StoreCredentialVerifier<S> {
    fn verify(&self, username: &str, password: &str) -> Result<(), Error> {
        let user = self.store.get(username).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

        match user.password_hash().verify(password)? {
            true => Ok(()),
            false => Err(Error::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod store_credential_verifier_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        stores::{SqliteUserStore, UserStore},
        user::PasswordHash,
    };

    use super::{CredentialVerifier, StoreCredentialVerifier};

    fn get_verifier() -> StoreCredentialVerifier<SqliteUserStore> {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let mut store = SqliteUserStore::new(Arc::new(Mutex::new(connection)));
        let hash = PasswordHash::from_raw_password("correct horse", PasswordHash::MIN_COST).unwrap();
        store.create("alice", hash).unwrap();

        StoreCredentialVerifier::new(store)
    }

    #[test]
    fn verify_accepts_valid_credentials() {
        let verifier = get_verifier();

        assert_eq!(verifier.verify("alice", "correct horse"), Ok(()));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let verifier = get_verifier();

        assert_eq!(
            verifier.verify("alice", "battery staple"),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn unknown_user_is_indistinguishable_from_wrong_password() {
        let verifier = get_verifier();

        assert_eq!(
            verifier.verify("bob", "correct horse"),
            Err(Error::InvalidCredentials)
        );
    }
}
