//! Authentication middleware that verifies the credential on every protected request.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{TokenKeys, cookie::get_token_from_cookie, verify_token},
    error::{INVALID_TOKEN_MESSAGE, NO_TOKEN_MESSAGE},
    user::{UserProfile, get_user_by_id},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The keys for verifying credentials.
    pub token_keys: TokenKeys,
    /// The database connection for resolving users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The verified identity of the client making a request.
///
/// Only exists for requests that passed [auth_guard].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    /// The user the credential resolved to.
    pub user: UserProfile,
    /// The credential as it was presented.
    pub token: String,
}

/// Middleware function that checks for a valid credential.
///
/// The credential is read from the `token` cookie first and then from a
/// `Bearer` authorization header. If it verifies and its subject is still a
/// registered user, an [AuthenticatedUser] is placed into the request and the
/// request executed normally. Otherwise a 401 response is returned and the
/// route handler never runs.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(auth): Extension<AuthenticatedUser>` to receive the identity.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(authenticated_user) => {
            request.extensions_mut().insert(authenticated_user);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<AuthenticatedUser, Error> {
    let token = extract_token(headers).ok_or(Error::Unauthenticated(NO_TOKEN_MESSAGE))?;
    let claims = verify_token(&token, &state.token_keys)?;

    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_id(claims.sub, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            tracing::debug!("Credential subject {} no longer exists", claims.sub);
            return Err(Error::Unauthenticated(INVALID_TOKEN_MESSAGE));
        }
        Err(error) => return Err(error),
    };

    Ok(AuthenticatedUser {
        user: UserProfile::from(&user),
        token,
    })
}

/// Find the credential in the cookie, falling back to the authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);

    get_token_from_cookie(&jar).or_else(|| {
        headers
            .typed_get::<Authorization<Bearer>>()
            .map(|Authorization(bearer)| bearer.token().to_owned())
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Json, Router, http::StatusCode, middleware, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        AppState,
        auth::{COOKIE_TOKEN, TokenKeys},
        error::{INVALID_TOKEN_MESSAGE, NO_TOKEN_MESSAGE},
        test_utils::{must_create_test_state, must_create_user, must_issue_token, response_message},
        user::UserProfile,
    };

    use super::{AuthState, AuthenticatedUser, auth_guard};

    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(auth): Extension<AuthenticatedUser>) -> Json<UserProfile> {
        Json(auth.user)
    }

    fn get_test_server(state: &AppState) -> TestServer {
        let auth_state = AuthState {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(auth_state, auth_guard));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn accepts_token_in_cookie() {
        let state = must_create_test_state();
        let user = must_create_user(&state, "ravi");
        let token = must_issue_token(&state, user.id);
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(COOKIE_TOKEN, token))
            .await;

        response.assert_status_ok();
        response.assert_json(&UserProfile::from(&user));
    }

    #[tokio::test]
    async fn accepts_bearer_token() {
        let state = must_create_test_state();
        let user = must_create_user(&state, "ravi");
        let token = must_issue_token(&state, user.id);
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_json(&UserProfile::from(&user));
    }

    #[tokio::test]
    async fn cookie_takes_precedence_over_header() {
        let state = must_create_test_state();
        let cookie_user = must_create_user(&state, "ravi");
        let header_user = must_create_user(&state, "sita");
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(
                COOKIE_TOKEN,
                must_issue_token(&state, cookie_user.id),
            ))
            .authorization_bearer(must_issue_token(&state, header_user.id))
            .await;

        response.assert_status_ok();
        response.assert_json(&UserProfile::from(&cookie_user));
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response_message(&response), NO_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn rejects_header_without_bearer_scheme() {
        let state = must_create_test_state();
        let user = must_create_user(&state, "ravi");
        let token = must_issue_token(&state, user.id);
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("Authorization", format!("Token {token}"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response_message(&response), NO_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn rejects_token_signed_with_another_secret() {
        let state = must_create_test_state();
        let user = must_create_user(&state, "ravi");
        let mut other_state = must_create_test_state();
        other_state.token_keys = TokenKeys::from_secret("a different secret");
        let forged_token = must_issue_token(&other_state, user.id);
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(forged_token)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response_message(&response), INVALID_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn rejects_malformed_cookie() {
        let state = must_create_test_state();
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "FOOBAR"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response_message(&response), INVALID_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn rejects_token_for_deleted_user() {
        let state = must_create_test_state();
        let user = must_create_user(&state, "ravi");
        let token = must_issue_token(&state, user.id);
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DELETE FROM user WHERE id = ?1", (user.id.as_i64(),))
            .unwrap();
        let server = get_test_server(&state);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response_message(&response), INVALID_TOKEN_MESSAGE);
    }
}
