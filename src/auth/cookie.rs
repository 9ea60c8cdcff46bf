//! The private session cookie that marks a client as logged in.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// The name of the session cookie.
pub(crate) const SESSION_COOKIE: &str = "session";

/// The default duration for which the session cookie is valid.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(2);

mod datetime_format {
    //! Serializes the token expiry in a fixed custom format. The default
    //! serializer for [time::OffsetDateTime] prints midnight with a
    //! single-digit hour, which its own deserializer then rejects.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// E.g. "2024-07-01 16:30:00.0 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = datetime
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&string, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// The contents of the session cookie.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionToken {
    /// Who the session belongs to.
    pub username: String,

    /// When the session stops being valid, checked server-side on every
    /// guarded request.
    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

/// Add a session cookie for `username` to the jar, valid for `duration`
/// from now.
///
/// # Errors
/// Returns [Error::JsonSerializationError] if the token cannot be
/// serialized.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    username: &str,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = SessionToken {
        username: username.to_owned(),
        expires_at,
    };
    let value = serde_json::to_string(&token)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, value))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Overwrite the session cookie with an expired dummy value, which deletes
/// it on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read and validate the session token from the cookie jar.
///
/// # Errors
/// Returns [Error::CookieMissing] if there is no session cookie and
/// [Error::InvalidCredentials] if the cookie cannot be parsed or the
/// session has expired.
pub(crate) fn get_session_token(jar: &PrivateCookieJar) -> Result<SessionToken, Error> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(Error::CookieMissing)?;

    let token: SessionToken =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.expires_at < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    Ok(token)
}
