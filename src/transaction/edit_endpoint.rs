//! Defines the endpoint for updating a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::AuthenticatedUser,
    transaction::{Transaction, TransactionId, TransactionPayload, core::update_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that merges the request body into one of the requesting
/// user's transactions and responds with the updated transaction.
///
/// The derived fields are recomputed and the owner cannot be changed.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, or [Error::Validation] if a field in the body is malformed.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
    WithRejection(Json(payload), _): WithRejection<Json<TransactionPayload>, Error>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = update_transaction(
        transaction_id,
        auth.user.id,
        |current| payload.apply_update(current),
        &connection,
    )?;

    Ok(Json(transaction))
}
