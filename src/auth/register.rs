//! The route handler for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    password::PasswordHash,
    user::{UserProfile, create_user},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for looking up and storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a new user.
#[derive(Serialize, Deserialize)]
pub struct RegisterData {
    /// The unique name to log in with.
    pub username: String,
    /// The name to display.
    pub name: String,
    /// The password in plain text, hashed before it is stored.
    pub password: String,
}

/// Create a new user and respond with their profile.
///
/// Does not log the new user in.
///
/// # Errors
///
/// Returns a 400 response if a field is blank, the password is too weak or
/// the username is already taken.
pub async fn post_register(
    State(state): State<RegistrationState>,
    WithRejection(Json(data), _): WithRejection<Json<RegisterData>, Error>,
) -> Result<(StatusCode, Json<UserProfile>), Error> {
    let username = data.username.trim();
    let name = data.name.trim();

    if username.is_empty() || name.is_empty() {
        return Err(Error::Validation(
            "Username and name are required".to_owned(),
        ));
    }

    let password_hash =
        PasswordHash::from_raw_password(&data.password, PasswordHash::DEFAULT_COST)?;

    let connection = lock_connection(&state.db_connection)?;

    let user = create_user(username, name, password_hash, &connection)?;
    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}
