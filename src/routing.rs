//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error,
    auth::{auth_guard, get_session, post_log_in, post_log_out, post_register},
    endpoints,
    error::error_detail_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint, preview_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except registration, log-in and log-out requires a valid
/// credential.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(post_register))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(endpoints::SESSION, get(get_session))
        .route(endpoints::TRANSACTIONS, get(list_transactions_endpoint))
        .route(
            endpoints::ADD_TRANSACTION,
            post(create_transaction_endpoint),
        )
        .route(
            endpoints::PREVIEW_TRANSACTION,
            post(preview_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_detail_middleware,
        ))
        .with_state(state)
}

/// Build the CORS layer that lets the web client at `client_origin` call the
/// API with cookies.
///
/// # Errors
///
/// Returns an [Error::Configuration] if `client_origin` is not a valid header value.
pub fn cors_layer(client_origin: &str) -> Result<CorsLayer, Error> {
    let origin = client_origin.parse::<HeaderValue>().map_err(|error| {
        Error::Configuration(format!("invalid client origin \"{client_origin}\": {error}"))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route not found" })),
    )
        .into_response()
}
