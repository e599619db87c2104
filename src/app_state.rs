//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::Duration;

use crate::{Error, auth::TokenKeys, db::initialize};

/// The default duration for which credentials are valid.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::hours(24);

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The keys for signing and verifying credentials.
    pub token_keys: TokenKeys,

    /// The duration for which newly issued credentials are valid.
    pub token_duration: Duration,

    /// Whether the detail of unexpected errors is sent to clients.
    pub expose_error_details: bool,

    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        token_duration: Duration,
        expose_error_details: bool,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            token_keys: TokenKeys::from_secret(token_secret),
            token_duration,
            expose_error_details,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

/// Acquire the lock on the database connection.
///
/// # Errors
/// Returns an [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Mutex<Connection>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}
