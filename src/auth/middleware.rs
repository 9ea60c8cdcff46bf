//! Middleware that restricts routes to logged-in clients.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    AppState,
    auth::cookie::{get_session_token, set_session_cookie},
};

/// The username behind the current request, inserted into the request
/// extensions by [auth_guard] so handlers do not have to touch the cookie
/// jar themselves.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Checks that the client has a valid session cookie before letting the
/// request through, and refreshes the cookie's expiry on the way out.
///
/// Requests without a valid session get a 401 response.
pub async fn auth_guard(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match get_session_token(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser(token.username.clone()));

    // Sliding expiry: each authenticated request pushes the deadline back.
    let jar = match set_session_cookie(jar, &token.username, state.cookie_duration()) {
        Ok(jar) => jar,
        Err(error) => return error.into_response(),
    };

    (jar, next.run(request).await).into_response()
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Router, middleware, routing::get, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState,
        log_in::post_log_in,
        stores::UserStore,
        user::PasswordHash,
    };

    use super::{AuthenticatedUser, auth_guard};

    async fn whoami(Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>) -> String {
        username
    }

    fn get_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), "42").unwrap();

        let hash = PasswordHash::from_raw_password("hunter2", PasswordHash::MIN_COST).unwrap();
        let mut user_store = state.user_store();
        user_store.create("alice", hash).unwrap();

        let app = Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route("/log_in", post(post_log_in))
            .with_state(state);

        let mut server = TestServer::new(app);
        server.save_cookies();

        server
    }

    #[tokio::test]
    async fn request_without_cookie_is_rejected() {
        let server = get_server();

        let response = server.get("/protected").await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn request_with_garbage_cookie_is_rejected() {
        let server = get_server();

        let response = server
            .get("/protected")
            .add_header("cookie", "session=definitely-not-signed")
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn logged_in_client_passes_and_sees_their_username() {
        let server = get_server();

        server
            .post("/log_in")
            .json(&json!({"username": "alice", "password": "hunter2"}))
            .await
            .assert_status_ok();

        let response = server.get("/protected").await;

        response.assert_status_ok();
        response.assert_text("alice");
    }
}
