//! Pure aggregation over in-memory transaction collections.
//!
//! Every function here takes already-validated [Transaction] values; the
//! ingestion boundary guarantees that nothing malformed can reach this
//! module, so there is no row-exclusion or error handling to do. All
//! results are derived from scratch on each call, the way the dashboards
//! consume them.

use std::collections::{BTreeMap, HashMap};

use crate::{
    period::PeriodKey,
    transaction::{Class, Transaction},
};

/// The total amount across all transactions of the given class.
///
/// Returns 0.0 when no transaction matches.
pub fn sum_by_class(transactions: &[Transaction], class: Class) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.class == class)
        .map(|transaction| transaction.amount)
        .sum()
}

/// The total amount for the given class within one period.
pub fn sum_by_class_in_period(
    transactions: &[Transaction],
    class: Class,
    period: &PeriodKey,
) -> f64 {
    transactions
        .iter()
        .filter(|transaction| {
            transaction.class == class && PeriodKey::from_date(transaction.date) == *period
        })
        .map(|transaction| transaction.amount)
        .sum()
}

/// Sums amounts of the given class per period.
///
/// Periods with no matching transactions are absent from the result
/// rather than mapped to zero.
pub fn totals_by_period(transactions: &[Transaction], class: Class) -> BTreeMap<PeriodKey, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions {
        if transaction.class != class {
            continue;
        }

        let period = PeriodKey::from_date(transaction.date);
        *totals.entry(period).or_insert(0.0) += transaction.amount;
    }

    totals
}

/// Sums amounts of the given class per category, optionally restricted to
/// one period.
///
/// Categories with no matching transactions are absent from the result.
pub fn totals_by_category(
    transactions: &[Transaction],
    class: Class,
    period: Option<&PeriodKey>,
) -> HashMap<String, f64> {
    let mut totals = HashMap::new();

    for transaction in transactions {
        if transaction.class != class {
            continue;
        }

        if let Some(period) = period
            && PeriodKey::from_date(transaction.date) != *period
        {
            continue;
        }

        *totals.entry(transaction.category.clone()).or_insert(0.0) += transaction.amount;
    }

    totals
}

/// For each period, the category with the largest expense total.
///
/// Ties are broken by taking the lexicographically smallest category, so
/// the result does not depend on the order of the input sequence.
pub fn top_expense_category_by_period(
    transactions: &[Transaction],
) -> BTreeMap<PeriodKey, (String, f64)> {
    let mut totals: BTreeMap<PeriodKey, HashMap<String, f64>> = BTreeMap::new();

    for transaction in transactions {
        if transaction.class != Class::Expense {
            continue;
        }

        let period = PeriodKey::from_date(transaction.date);
        *totals
            .entry(period)
            .or_default()
            .entry(transaction.category.clone())
            .or_insert(0.0) += transaction.amount;
    }

    totals
        .into_iter()
        .filter_map(|(period, by_category)| {
            let mut ranked: Vec<(String, f64)> = by_category.into_iter().collect();
            ranked.sort_by(|(category_a, total_a), (category_b, total_b)| {
                total_b
                    .total_cmp(total_a)
                    .then_with(|| category_a.cmp(category_b))
            });

            ranked.into_iter().next().map(|top| (period, top))
        })
        .collect()
}

/// Income minus expense for one period. Negative means a deficit; the
/// sign must be preserved by callers.
pub fn net_remaining(transactions: &[Transaction], period: &PeriodKey) -> f64 {
    let income = sum_by_class_in_period(transactions, Class::Income, period);
    let expense = sum_by_class_in_period(transactions, Class::Expense, period);

    income - expense
}
