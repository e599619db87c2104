//! Defines functions for carrying the credential in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::auth::IssuedToken;

/// The name of the cookie that holds the credential.
pub const COOKIE_TOKEN: &str = "token";

/// Add the credential cookie to the cookie jar.
///
/// The cookie expires when the credential does.
pub fn set_auth_cookie(jar: CookieJar, issued: &IssuedToken) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, issued.token.clone()))
            .path("/")
            .expires(issued.expires_at)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Set the credential cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Get the credential from the cookie jar, ignoring empty values.
pub fn get_token_from_cookie(jar: &CookieJar) -> Option<String> {
    jar.get(COOKIE_TOKEN)
        .map(|cookie| cookie.value_trimmed().to_owned())
        .filter(|token| !token.is_empty())
}
