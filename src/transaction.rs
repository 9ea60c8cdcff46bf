//! The transaction record and its income/expense classification.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use time::Date;

use crate::Error;

/// Whether a transaction added money to the budget or took money out of it.
///
/// Parsing is case-insensitive (`"INCOME"`, `"income"` and `"Income"` are all
/// [Class::Income]); the canonical spelling is used everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl Class {
    /// The canonical string form, as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Class::Income => "Income",
            Class::Expense => "Expense",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Class {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let trimmed = string.trim();

        if trimmed.eq_ignore_ascii_case("income") {
            Ok(Class::Income)
        } else if trimmed.eq_ignore_ascii_case("expense") {
            Ok(Class::Expense)
        } else {
            Err(Error::InvalidTransaction(format!(
                "'{string}' is not a valid class, expected 'Income' or 'Expense'"
            )))
        }
    }
}

impl Serialize for Class {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Class {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(de::Error::custom)
    }
}

/// A single income or expense record.
///
/// Transactions are immutable once persisted: the store is append-only and
/// duplicates are allowed, so there is no identity beyond the field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// When the transaction happened.
    pub date: Date,
    /// A free-text label grouping similar transactions. May be empty.
    pub category: String,
    /// A free-text note about the transaction. May be empty.
    pub description: String,
    /// The amount of money earned or spent. Always finite.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub class: Class,
}

impl Transaction {
    /// Create a transaction from fields that were already checked by the
    /// presentation layer, enforcing only the record invariants.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransaction] if `amount` is not a finite number.
    pub fn new(
        date: Date,
        category: String,
        description: String,
        amount: f64,
        class: Class,
    ) -> Result<Self, Error> {
        if !amount.is_finite() {
            return Err(Error::InvalidTransaction(format!(
                "amount must be a finite number, got {amount}"
            )));
        }

        Ok(Self {
            date,
            category,
            description,
            amount,
            class,
        })
    }
}

#[cfg(test)]
mod class_tests {
    use crate::Error;

    use super::Class;

    #[test]
    fn parse_is_case_insensitive() {
        for input in ["INCOME", "income", "Income", " income "] {
            assert_eq!(input.parse::<Class>().unwrap(), Class::Income);
        }

        for input in ["EXPENSE", "expense", "Expense"] {
            assert_eq!(input.parse::<Class>().unwrap(), Class::Expense);
        }
    }

    #[test]
    fn parse_rejects_other_labels() {
        let result = "transfer".parse::<Class>();

        assert!(matches!(result, Err(Error::InvalidTransaction(_))));
    }

    #[test]
    fn serialises_with_canonical_spelling() {
        assert_eq!(serde_json::to_string(&Class::Income).unwrap(), "\"Income\"");
        assert_eq!(
            serde_json::from_str::<Class>("\"eXpEnSe\"").unwrap(),
            Class::Expense
        );
    }
}
