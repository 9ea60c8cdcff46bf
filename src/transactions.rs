//! The endpoints for recording and listing transactions.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    period::PeriodKey,
    stores::TransactionStore,
    transaction::{Class, Transaction},
};

/// The details of a transaction entered by hand.
#[derive(Debug, Deserialize)]
pub struct NewTransaction {
    /// When the transaction happened.
    pub date: Date,
    /// A free-form grouping label, e.g. "Groceries".
    pub category: String,
    /// An optional note.
    #[serde(default)]
    pub description: String,
    /// The amount of money, signed and finite.
    pub amount: f64,
    /// Whether the money came in or went out.
    pub class: Class,
}

/// Record a single transaction in the month partition its date falls in.
///
/// Responds with 201 and the recorded transaction. Unlike a CSV upload,
/// a manual entry is persisted immediately, there is nothing to commit.
pub async fn post_transaction(
    State(state): State<AppState>,
    Json(new_transaction): Json<NewTransaction>,
) -> Result<Response, Error> {
    let transaction = Transaction::new(
        new_transaction.date,
        new_transaction.category,
        new_transaction.description,
        new_transaction.amount,
        new_transaction.class,
    )?;

    let period = PeriodKey::from_date(transaction.date);
    state
        .transaction_store()
        .append(&period, std::slice::from_ref(&transaction))?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// The query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Limit the listing to a single month, e.g. "2024-07".
    pub period: Option<PeriodKey>,
}

/// List transactions, optionally restricted to one month.
///
/// A month that has never seen a transaction yields an empty list rather
/// than an error.
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let store = state.transaction_store();

    let transactions = match query.period {
        Some(period) => match store.read_partition(&period) {
            Ok(transactions) => transactions,
            Err(Error::PartitionNotFound(_)) => Vec::new(),
            Err(error) => return Err(error),
        },
        None => store.read_all()?,
    };

    Ok(Json(transactions))
}
