//! Per-user staging of batch imports before they are persisted.
//!
//! The transaction store is the single source of truth for analytics; a
//! [Session] only holds rows that were parsed from an upload but not yet
//! committed, so the client can preview (and discard) a batch before it
//! becomes durable.

use std::collections::BTreeMap;

use crate::{Error, period::PeriodKey, stores::TransactionStore, transaction::Transaction};

/// The staged-but-not-yet-persisted transactions of one logged-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The username the session belongs to.
    pub username: String,
    staged: Vec<Transaction>,
}

impl Session {
    /// Create an empty session for `username`.
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_owned(),
            staged: Vec::new(),
        }
    }

    /// The staged transactions in the order they were staged.
    pub fn staged(&self) -> &[Transaction] {
        &self.staged
    }

    /// Whether there is anything waiting to be committed.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Add `transactions` to the staged collection.
    pub fn stage_all(&mut self, transactions: Vec<Transaction>) {
        self.staged.extend(transactions);
    }

    /// Drop the staged collection, returning how many rows were discarded.
    pub fn discard(&mut self) -> usize {
        let discarded = self.staged.len();
        self.staged.clear();

        discarded
    }

    /// Persist the staged transactions, grouped into one append per period
    /// partition, then clear the buffer.
    ///
    /// Returns the number of rows written. Each append is atomic at the
    /// partition level; if one fails, the rows that were not persisted stay
    /// staged so the commit can be retried.
    ///
    /// # Errors
    /// Returns the first error from [TransactionStore::append].
    pub fn commit(&mut self, store: &mut impl TransactionStore) -> Result<usize, Error> {
        let mut groups: BTreeMap<PeriodKey, Vec<Transaction>> = BTreeMap::new();

        for transaction in self.staged.drain(..) {
            groups
                .entry(PeriodKey::from_date(transaction.date))
                .or_default()
                .push(transaction);
        }

        let mut written = 0;
        let mut groups = groups.into_iter();

        while let Some((period, group)) = groups.next() {
            match store.append(&period, &group) {
                Ok(count) => written += count,
                Err(error) => {
                    // Re-stage the failed group and everything not yet attempted.
                    self.staged.extend(group);
                    for (_, rest) in groups {
                        self.staged.extend(rest);
                    }

                    return Err(error);
                }
            }
        }

        Ok(written)
    }
}
