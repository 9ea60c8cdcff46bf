//! Assembles the route handlers into the application router.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::middleware::auth_guard,
    endpoints,
    import::{delete_staged, get_staged, post_commit, post_import},
    log_in::{get_log_out, post_log_in},
    logging::logging_middleware,
    summary::{get_period_summaries, get_period_summary, get_summary},
    transactions::{get_transactions, post_transaction},
};

/// Build the router for the whole application.
///
/// Everything except logging in and out sits behind the session cookie
/// guard.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(post_transaction),
        )
        .route(endpoints::IMPORT, post(post_import))
        .route(
            endpoints::IMPORT_STAGED,
            get(get_staged).delete(delete_staged),
        )
        .route(endpoints::IMPORT_COMMIT, post(post_commit))
        .route(endpoints::SUMMARY, get(get_summary))
        .route(endpoints::SUMMARY_PERIODS, get(get_period_summaries))
        .route(endpoints::SUMMARY_PERIOD, get(get_period_summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    Router::new()
        .merge(protected_routes)
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
