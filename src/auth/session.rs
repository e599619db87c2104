//! The route for reading back the session of an authenticated client.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthenticatedUser, user::UserProfile};

/// The session of the client making the request.
///
/// Clients use this to restore who is logged in instead of keeping their own
/// copy of the user and credential.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// The logged in user.
    pub user: UserProfile,
    /// The credential the request was made with.
    pub token: String,
}

/// Return the user and credential that the auth guard verified.
pub async fn get_session(Extension(auth): Extension<AuthenticatedUser>) -> Json<Session> {
    Json(Session {
        user: auth.user,
        token: auth.token,
    })
}
