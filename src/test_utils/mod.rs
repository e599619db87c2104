#![allow(missing_docs)]

use axum_test::TestResponse;
use rusqlite::Connection;
use time::{Date, Duration};

use crate::{
    AppState,
    app_state::DEFAULT_TOKEN_DURATION,
    auth::{AuthenticatedUser, issue_token},
    password::{PasswordHash, ValidatedPassword},
    transaction::{NewTransaction, Transaction, create_transaction},
    user::{User, UserID, UserProfile, create_user},
};

/// A password strong enough to pass registration.
pub(crate) const TEST_PASSWORD: &str = "roostersgocockledoodledoo";

const TEST_TOKEN_SECRET: &str = "correct horse battery staple";

pub(crate) fn must_create_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");

    AppState::new(
        connection,
        TEST_TOKEN_SECRET,
        DEFAULT_TOKEN_DURATION,
        false,
    )
    .expect("Could not create app state")
}

/// Create a user whose password is [TEST_PASSWORD], hashed with a low cost to keep tests fast.
pub(crate) fn must_create_user(state: &AppState, username: &str) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash password");

    create_user(
        username,
        username,
        password_hash,
        &state.db_connection.lock().unwrap(),
    )
    .expect("Could not create user")
}

pub(crate) fn must_issue_token(state: &AppState, user_id: UserID) -> String {
    issue_token(user_id, Duration::minutes(5), &state.token_keys)
        .expect("Could not issue token")
        .token
}

/// The identity the auth guard would attach for `user`.
pub(crate) fn must_authenticate(user: &User) -> AuthenticatedUser {
    AuthenticatedUser {
        user: UserProfile::from(user),
        token: "header.claims.signature".to_owned(),
    }
}

pub(crate) fn must_create_transaction(
    state: &AppState,
    owner: &User,
    party: &str,
    date: Date,
) -> Transaction {
    create_transaction(
        owner.id,
        &NewTransaction {
            date,
            party: party.to_owned(),
            rate: 1000.0,
            bag: 10,
            gross_weight: 500.0,
            kapat_per_bag: 1.75,
        },
        &state.db_connection.lock().unwrap(),
    )
    .expect("Could not create transaction")
}

/// Get the `message` field of a JSON response body.
#[track_caller]
pub(crate) fn response_message(response: &TestResponse) -> String {
    response.json::<serde_json::Value>()["message"]
        .as_str()
        .expect("response body has no message")
        .to_owned()
}
