//! Defines the endpoints for reading a user's transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
};
use axum_extra::extract::WithRejection;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    auth::AuthenticatedUser,
    transaction::{
        Transaction, TransactionId, TransactionQuery,
        core::{get_transaction, list_transactions},
        payload::parse_date_str,
    },
};

/// The state needed to read transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw query parameters for listing transactions.
///
/// Empty parameters, e.g. `?date=`, are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListQueryParams {
    party: Option<String>,
    date: Option<String>,
}

impl ListQueryParams {
    fn into_query(self) -> Result<TransactionQuery, Error> {
        let date = match self.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => Some(parse_date_str("date", date)?),
            _ => None,
        };

        Ok(TransactionQuery {
            party: self.party,
            date,
        })
    }
}

/// A route handler that lists the requesting user's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(auth): Extension<AuthenticatedUser>,
    WithRejection(Query(params), _): WithRejection<Query<ListQueryParams>, Error>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let query = params.into_query()?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = list_transactions(auth.user.id, &query, &connection)?;

    Ok(Json(transactions))
}

/// A route handler that returns one of the requesting user's transactions.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub async fn get_transaction_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(auth): Extension<AuthenticatedUser>,
    WithRejection(Path(transaction_id), _): WithRejection<Path<TransactionId>, Error>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = get_transaction(transaction_id, auth.user.id, &connection)?;

    Ok(Json(transaction))
}
