//! The endpoints for importing transactions from a CSV upload.
//!
//! An upload does not touch storage straight away. The parsed rows are
//! staged in the uploader's session so they can review them, and only a
//! commit writes them to the store.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use serde::Serialize;

use crate::{
    AppState, Error,
    auth::middleware::AuthenticatedUser,
    csv::parse_transactions_csv,
    session::Session,
    transaction::Transaction,
};

/// What became of an uploaded CSV file.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// How many rows of this upload were staged.
    pub staged: usize,
    /// How many rows of this upload were skipped as malformed.
    pub skipped: usize,
    /// How many rows are staged in total, including earlier uploads.
    pub total_staged: usize,
}

/// The outcome of committing the staged rows.
#[derive(Debug, Serialize)]
pub struct CommitSummary {
    /// How many rows were written to storage.
    pub committed: usize,
}

/// The outcome of discarding the staged rows.
#[derive(Debug, Serialize)]
pub struct DiscardSummary {
    /// How many rows were thrown away.
    pub discarded: usize,
}

/// Pull the text out of every file field of the upload, in field order.
async fn read_csv_texts(multipart: &mut Multipart) -> Result<Vec<String>, Error> {
    let mut texts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        let Some(content_type) = field.content_type() else {
            continue;
        };

        if content_type != "text/csv" {
            return Err(Error::NotCsv);
        }

        texts.push(
            field
                .text()
                .await
                .map_err(|error| Error::MultipartError(error.to_string()))?,
        );
    }

    if texts.is_empty() {
        return Err(Error::MultipartError(
            "the upload contained no file".to_string(),
        ));
    }

    Ok(texts)
}

/// Parse the uploaded CSV files and stage their rows in the uploader's
/// session.
///
/// Rows that cannot be parsed are counted and dropped, they do not fail
/// the upload. A file whose header is missing a required column fails the
/// whole upload with a 400 response.
pub async fn post_import(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, Error> {
    let mut transactions = Vec::new();
    let mut skipped = 0;

    for text in read_csv_texts(&mut multipart).await? {
        let mut result = parse_transactions_csv(&text)?;
        transactions.append(&mut result.transactions);
        skipped += result.skipped;
    }

    let staged = transactions.len();
    let mut sessions = state.sessions()?;
    let session = sessions
        .entry(username.clone())
        .or_insert_with(|| Session::new(&username));
    session.stage_all(transactions);

    tracing::info!("user {username} staged {staged} rows ({skipped} skipped)");

    Ok(Json(ImportSummary {
        staged,
        skipped,
        total_staged: session.staged().len(),
    }))
}

/// List the rows staged by earlier uploads, oldest upload first.
pub async fn get_staged(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let sessions = state.sessions()?;

    let staged = sessions
        .get(&username)
        .map(|session| session.staged().to_vec())
        .unwrap_or_default();

    Ok(Json(staged))
}

/// Write the staged rows to storage, grouped into their month partitions.
///
/// The session is left empty on success. If a partition cannot be written
/// the rows that were not persisted stay staged, so the commit can be
/// retried without re-uploading.
pub async fn post_commit(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Result<Json<CommitSummary>, Error> {
    let mut sessions = state.sessions()?;
    let session = sessions
        .entry(username.clone())
        .or_insert_with(|| Session::new(&username));

    let mut store = state.transaction_store();
    let committed = session.commit(&mut store)?;

    tracing::info!("user {username} committed {committed} rows");

    Ok(Json(CommitSummary { committed }))
}

/// Throw away the staged rows without writing them.
pub async fn delete_staged(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Result<Json<DiscardSummary>, Error> {
    let mut sessions = state.sessions()?;

    let discarded = sessions
        .get_mut(&username)
        .map(Session::discard)
        .unwrap_or_default();

    Ok(Json(DiscardSummary { discarded }))
}
