//! The endpoints reporting aggregate income and expense figures.
//!
//! All figures are computed from the store on each request; nothing is
//! cached or maintained incrementally.

use std::collections::{BTreeMap, BTreeSet};

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    AppState, Error,
    analytics::{
        net_remaining, sum_by_class, top_expense_category_by_period, totals_by_category,
        totals_by_period,
    },
    period::PeriodKey,
    stores::TransactionStore,
    transaction::Class,
};

/// Income and expense totals across all recorded months.
#[derive(Debug, Serialize)]
pub struct OverallSummary {
    /// The sum of all income transactions.
    pub income: f64,
    /// The sum of all expense transactions.
    pub expense: f64,
    /// Income minus expense. Negative means an overall deficit.
    pub remaining: f64,
}

/// The category a month spent the most on.
#[derive(Debug, Serialize)]
pub struct TopCategory {
    /// The category label.
    pub category: String,
    /// The summed expense of the category in that month.
    pub amount: f64,
}

/// The headline figures of one month.
#[derive(Debug, Serialize)]
pub struct PeriodOverview {
    /// The month, e.g. "2024-07".
    pub period: PeriodKey,
    /// The month's income total.
    pub income: f64,
    /// The month's expense total.
    pub expense: f64,
    /// Income minus expense for the month.
    pub remaining: f64,
    /// The category with the largest expense total, if the month had any
    /// expenses at all.
    pub top_expense_category: Option<TopCategory>,
}

/// The full breakdown of a single month.
#[derive(Debug, Serialize)]
pub struct PeriodSummary {
    /// The month, e.g. "2024-07".
    pub period: PeriodKey,
    /// The month's income total.
    pub income: f64,
    /// The month's expense total.
    pub expense: f64,
    /// Income minus expense for the month.
    pub remaining: f64,
    /// Expense totals per category, sorted by category.
    pub expense_by_category: BTreeMap<String, f64>,
}

/// Report the overall income, expense and net remaining figures.
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<OverallSummary>, Error> {
    let transactions = state.transaction_store().read_all()?;

    let income = sum_by_class(&transactions, Class::Income);
    let expense = sum_by_class(&transactions, Class::Expense);

    Ok(Json(OverallSummary {
        income,
        expense,
        remaining: income - expense,
    }))
}

/// Report the headline figures of every month that has data, in
/// chronological order.
pub async fn get_period_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<PeriodOverview>>, Error> {
    let transactions = state.transaction_store().read_all()?;

    let income_by_period = totals_by_period(&transactions, Class::Income);
    let expense_by_period = totals_by_period(&transactions, Class::Expense);
    let mut top_by_period = top_expense_category_by_period(&transactions);

    let periods: BTreeSet<PeriodKey> = income_by_period
        .keys()
        .chain(expense_by_period.keys())
        .copied()
        .collect();

    let overviews = periods
        .into_iter()
        .map(|period| {
            let income = income_by_period.get(&period).copied().unwrap_or_default();
            let expense = expense_by_period.get(&period).copied().unwrap_or_default();

            PeriodOverview {
                period,
                income,
                expense,
                remaining: income - expense,
                top_expense_category: top_by_period
                    .remove(&period)
                    .map(|(category, amount)| TopCategory { category, amount }),
            }
        })
        .collect();

    Ok(Json(overviews))
}

/// Report the full breakdown of one month.
///
/// # Errors
/// Responds with 404 if the month has no data at all.
pub async fn get_period_summary(
    State(state): State<AppState>,
    Path(period): Path<PeriodKey>,
) -> Result<Json<PeriodSummary>, Error> {
    let transactions = state.transaction_store().read_partition(&period)?;

    let income = sum_by_class(&transactions, Class::Income);
    let expense = sum_by_class(&transactions, Class::Expense);
    let expense_by_category = totals_by_category(&transactions, Class::Expense, None)
        .into_iter()
        .collect();

    Ok(Json(PeriodSummary {
        period,
        income,
        expense,
        remaining: net_remaining(&transactions, &period),
        expense_by_category,
    }))
}

#[cfg(test)]
mod summary_endpoint_tests {
    use axum::{
        Router,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, transactions::post_transaction};

    use super::{get_period_summaries, get_period_summary, get_summary};

    async fn get_seeded_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42").unwrap();

        let app = Router::new()
            .route(endpoints::TRANSACTIONS, post(post_transaction))
            .route(endpoints::SUMMARY, get(get_summary))
            .route(endpoints::SUMMARY_PERIODS, get(get_period_summaries))
            .route(endpoints::SUMMARY_PERIOD, get(get_period_summary))
            .with_state(state);

        let server = TestServer::new(app);

        for (date, category, amount, class) in [
            ("2024-07-01", "Salary", 1000.0, "Income"),
            ("2024-07-10", "Rent", 300.0, "Expense"),
            ("2024-07-15", "Groceries", 42.5, "Expense"),
            ("2024-07-20", "Groceries", 57.5, "Expense"),
            ("2024-08-05", "Salary", 500.0, "Income"),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .json(&json!({
                    "date": date,
                    "category": category,
                    "amount": amount,
                    "class": class,
                }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        server
    }

    #[tokio::test]
    async fn overall_summary_nets_income_against_expense() {
        let server = get_seeded_server().await;

        let response = server.get(endpoints::SUMMARY).await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "income": 1500.0,
            "expense": 400.0,
            "remaining": 1100.0,
        }));
    }

    #[tokio::test]
    async fn period_summaries_are_chronological_and_name_the_top_category() {
        let server = get_seeded_server().await;

        let summaries = server
            .get(endpoints::SUMMARY_PERIODS)
            .await
            .json::<Value>();

        assert_eq!(
            summaries,
            json!([
                {
                    "period": "2024-07",
                    "income": 1000.0,
                    "expense": 400.0,
                    "remaining": 600.0,
                    "top_expense_category": {"category": "Rent", "amount": 300.0},
                },
                {
                    "period": "2024-08",
                    "income": 500.0,
                    "expense": 0.0,
                    "remaining": 500.0,
                    "top_expense_category": null,
                },
            ])
        );
    }

    #[tokio::test]
    async fn single_period_summary_breaks_expenses_down_by_category() {
        let server = get_seeded_server().await;

        let response = server.get("/api/summary/2024-07").await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "period": "2024-07",
            "income": 1000.0,
            "expense": 400.0,
            "remaining": 600.0,
            "expense_by_category": {"Groceries": 100.0, "Rent": 300.0},
        }));
    }

    #[tokio::test]
    async fn deficit_month_reports_negative_remaining() {
        let server = get_seeded_server().await;
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "date": "2024-09-01",
                "category": "Rent",
                "amount": 300.0,
                "class": "Expense",
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let september = server.get("/api/summary/2024-09").await.json::<Value>();

        assert_eq!(september["remaining"], -300.0);
    }

    #[tokio::test]
    async fn unknown_period_summary_is_not_found() {
        let server = get_seeded_server().await;

        let response = server.get("/api/summary/1999-01").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn malformed_period_summary_is_rejected() {
        let server = get_seeded_server().await;

        let response = server.get("/api/summary/July-2024").await;

        response.assert_status_bad_request();
    }
}
