//! The API endpoint URIs.

/// The route for logging in a user.
pub const LOG_IN: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/api/import";
/// The route to inspect or discard the staged rows of an upload.
pub const IMPORT_STAGED: &str = "/api/import/staged";
/// The route to commit the staged rows of an upload to storage.
pub const IMPORT_COMMIT: &str = "/api/import/commit";
/// The route for overall income, expense and net remaining figures.
pub const SUMMARY: &str = "/api/summary";
/// The route for the per-month breakdown across all months.
pub const SUMMARY_PERIODS: &str = "/api/summary/periods";
/// The route for the breakdown of a single month.
pub const SUMMARY_PERIOD: &str = "/api/summary/{period}";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::IMPORT);
        assert_endpoint_is_valid_uri(endpoints::IMPORT_STAGED);
        assert_endpoint_is_valid_uri(endpoints::IMPORT_COMMIT);
        assert_endpoint_is_valid_uri(endpoints::SUMMARY);
        assert_endpoint_is_valid_uri(endpoints::SUMMARY_PERIODS);
        assert_endpoint_is_valid_uri(endpoints::SUMMARY_PERIOD);
    }
}
