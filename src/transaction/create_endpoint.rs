//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::AuthenticatedUser,
    transaction::{Transaction, TransactionPayload, core::create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction owned by the requesting user.
///
/// Responds with 201 and the stored transaction. Any owner or derived fields
/// in the body are ignored.
///
/// # Errors
///
/// Returns an [Error::Validation] if a required field is missing or malformed.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(auth): Extension<AuthenticatedUser>,
    WithRejection(Json(payload), _): WithRejection<Json<TransactionPayload>, Error>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let new_transaction = payload.validate()?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(auth.user.id, &new_transaction, &connection)?;
    tracing::debug!(
        "User {} created transaction {}",
        auth.user.id,
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}
