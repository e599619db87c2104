//! Log-out route handler that invalidates the credential cookie.

use axum::Json;
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use crate::auth::invalidate_auth_cookie;

/// Invalidate the credential cookie.
///
/// Credentials are not revoked on the server, so a client holding a copy of
/// the token can keep using it until it expires.
pub async fn post_log_out(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "Logged out successfully" })))
}

#[cfg(test)]
mod log_out_tests {
    use axum::{Router, routing::post};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use time::OffsetDateTime;

    use crate::{auth::COOKIE_TOKEN, endpoints, test_utils::response_message};

    use super::post_log_out;

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let app = Router::new().route(endpoints::LOG_OUT, post(post_log_out));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .post(endpoints::LOG_OUT)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "header.claims.signature"))
            .await;

        response.assert_status_ok();
        assert_eq!(response_message(&response), "Logged out successfully");
        let cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
            "got expires {:?}, want {:?}",
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH),
        );
    }
}
