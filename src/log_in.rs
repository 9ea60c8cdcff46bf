//! The endpoints for starting and ending a session.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{
        CredentialVerifier, StoreCredentialVerifier,
        cookie::{get_session_token, invalidate_session_cookie, set_session_cookie},
    },
    session::Session,
};

/// The credentials sent by the client to log in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The name the user registered with.
    pub username: String,
    /// The user's raw password.
    pub password: String,
}

/// Verify the credentials and hand out a session cookie.
///
/// # Errors
/// Returns a 401 response if the credentials are wrong. An unknown
/// username and a wrong password produce the same response.
pub async fn post_log_in(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<Response, Error> {
    StoreCredentialVerifier::new(state.user_store())
        .verify(&credentials.username, &credentials.password)?;

    let jar = set_session_cookie(jar, &credentials.username, state.cookie_duration())?;

    // Returning users keep any rows they staged before their cookie expired.
    state
        .sessions()?
        .entry(credentials.username.clone())
        .or_insert_with(|| Session::new(&credentials.username));

    tracing::info!("user {} logged in", credentials.username);

    Ok((StatusCode::OK, jar).into_response())
}

/// End the session, discarding any staged import rows.
///
/// Logging out without a valid session is not an error.
pub async fn get_log_out(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    if let Ok(token) = get_session_token(&jar) {
        state.sessions()?.remove(&token.username);
        tracing::info!("user {} logged out", token.username);
    }

    let jar = invalidate_session_cookie(jar);

    Ok((StatusCode::OK, jar).into_response())
}
