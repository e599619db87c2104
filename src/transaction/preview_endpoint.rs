//! Defines the endpoint that computes the derived fields without storing anything.

use axum::Json;
use axum_extra::extract::WithRejection;

use crate::{
    Error,
    derivation::{DerivedFields, derive_checked},
    transaction::TransactionPayload,
};

/// A route handler that responds with the derived fields for the numeric
/// fields in the body.
///
/// Uses the same parsing and arithmetic as creating a transaction, so the
/// preview always matches what would be stored.
pub async fn preview_transaction_endpoint(
    WithRejection(Json(payload), _): WithRejection<Json<TransactionPayload>, Error>,
) -> Result<Json<DerivedFields>, Error> {
    let inputs = payload.derivation_inputs()?;

    Ok(Json(derive_checked(&inputs)?))
}
