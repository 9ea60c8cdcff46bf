//! Pennybook is a web app for tracking personal income and expenses.
//!
//! Transactions are stored append-only, partitioned by calendar month, and
//! summarised on demand. This library provides a JSON REST API for
//! recording transactions by hand, importing them from CSV files and
//! reading aggregate figures.

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

pub mod analytics;
mod app_state;
mod auth;
pub mod csv;
mod db;
mod endpoints;
mod import;
mod log_in;
mod logging;
pub mod period;
mod routing;
pub mod session;
pub mod stores;
mod summary;
pub mod transaction;
mod transactions;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use user::{PasswordHash, User};

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
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// A transaction field violated one of the record invariants, e.g. a
    /// non-finite amount or an unknown income/expense label.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A period string or month number did not describe a calendar month.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// The CSV file was structurally broken and no rows could be taken
    /// from it. Individual malformed rows are skipped, not reported here.
    #[error("could not parse the CSV file: {0}")]
    InvalidCsv(String),

    /// The multipart form did not contain a CSV file.
    #[error("file is not a CSV")]
    NotCsv,

    /// The multipart form could not be parsed.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// A month partition was read before anything was written to it.
    #[error("no data recorded for period {0}")]
    PartitionNotFound(String),

    /// The username already exists in the database.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// An empty string was used to create a user.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),

    /// Could not acquire a shared lock, most likely because another thread
    /// panicked while holding it.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::InvalidCredentials | Error::CookieMissing => StatusCode::UNAUTHORIZED,
            Error::InvalidTransaction(_)
            | Error::InvalidPeriod(_)
            | Error::InvalidCsv(_)
            | Error::MultipartError(_)
            | Error::DuplicateUsername(_)
            | Error::EmptyUsername => StatusCode::BAD_REQUEST,
            Error::NotCsv => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::NotFound | Error::PartitionNotFound(_) => StatusCode::NOT_FOUND,
            // Internal details are not intended to be shown to the client.
            ref error => {
                tracing::error!("An unexpected error occurred: {}", error);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal server error"})),
                )
                    .into_response();
            }
        };

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::Error;

    #[test]
    fn sql_errors_map_to_not_found_when_no_rows_matched() {
        let error = Error::from(rusqlite::Error::QueryReturnedNoRows);

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn credential_errors_become_unauthorized_responses() {
        for error in [Error::InvalidCredentials, Error::CookieMissing] {
            let response = error.into_response();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn missing_partition_becomes_a_not_found_response() {
        let response = Error::PartitionNotFound("2024-07".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_are_not_leaked_to_the_client() {
        let response = Error::HashingError("cost out of range".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
