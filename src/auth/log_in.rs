//! This file defines the route for handling log-in requests.
//! The token and cookie modules handle the lower level credential logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{CookieJar, WithRejection};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::{TokenKeys, cookie::set_auth_cookie, issue_token},
    user::{User, UserProfile, get_user_by_username},
};

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LogInState {
    /// The keys for signing credentials.
    pub token_keys: TokenKeys,
    /// The duration for which issued credentials are valid.
    pub token_duration: Duration,
    /// The database connection for looking up and storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The username of the account to log in to.
    pub username: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The body of a successful log-in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The signed credential, also set as the `token` cookie.
    pub token: String,
    /// The user that logged in.
    pub user: UserProfile,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the credential
/// and user profile are returned in the body.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not exist or the password is not correct.
/// - An internal error occurred when verifying the password or signing the credential.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: CookieJar,
    WithRejection(Json(log_in_data), _): WithRejection<Json<LogInData>, Error>,
) -> Result<(CookieJar, Json<LogInResponse>), Error> {
    let user = find_user(&log_in_data.username, &state.db_connection)?;

    let is_password_valid = user
        .password_hash
        .verify(&log_in_data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        tracing::info!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let issued = issue_token(user.id, state.token_duration, &state.token_keys)?;
    let jar = set_auth_cookie(jar, &issued);

    Ok((
        jar,
        Json(LogInResponse {
            token: issued.token,
            user: UserProfile::from(&user),
        }),
    ))
}

fn find_user(username: &str, db_connection: &Mutex<Connection>) -> Result<User, Error> {
    let connection = lock_connection(db_connection)?;

    match get_user_by_username(username, &connection) {
        Err(Error::NotFound) => Err(Error::InvalidCredentials),
        result => result,
    }
}
