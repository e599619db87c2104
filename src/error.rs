//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    extract::{
        Request, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;

/// The message sent to clients when no credential is presented.
pub const NO_TOKEN_MESSAGE: &str = "No token, authorization denied";

/// The message sent to clients when a credential fails verification.
pub const INVALID_TOKEN_MESSAGE: &str = "Token is not valid";

/// The message sent to clients for errors they cannot fix themselves.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Something went wrong!";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request carried no credential, or one that could not be verified
    /// or no longer resolves to a user.
    ///
    /// The string is the message sent to the client.
    #[error("unauthenticated: {0}")]
    Unauthenticated(&'static str),

    /// The username or password given at log-in is wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// This is also returned for records owned by someone else, so that
    /// clients cannot learn which IDs exist.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request body is missing a required field or has a field of the
    /// wrong type.
    #[error("{0}")]
    Validation(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The username is already taken.
    #[error("User already exists")]
    DuplicateUsername,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A credential could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The server was started with settings it cannot use.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.username") => Error::DuplicateUsername,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

/// The detail of an unexpected error, attached to the response so that
/// [error_detail_middleware] can expose it in development mode.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::TooWeak(_) | Error::DuplicateUsername => {
                StatusCode::BAD_REQUEST
            }
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::Configuration(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Error::Unauthenticated(message) => (*message).to_owned(),
            Error::InvalidCredentials => "Invalid credentials".to_owned(),
            Error::NotFound => "Transaction not found".to_owned(),
            Error::Validation(message) => message.clone(),
            Error::TooWeak(_) | Error::DuplicateUsername => self.to_string(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                let mut response =
                    (status, Json(json!({ "message": UNEXPECTED_ERROR_MESSAGE }))).into_response();
                response
                    .extensions_mut()
                    .insert(ErrorDetail(error.to_string()));
                return response;
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Add the detail of unexpected errors to the response body.
///
/// This only has an effect when the app is configured to expose error details,
/// which should only be the case during development.
pub async fn error_detail_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !state.expose_error_details {
        return response;
    }

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_TYPE);

    (
        parts,
        Json(json!({ "message": UNEXPECTED_ERROR_MESSAGE, "error": detail })),
    )
        .into_response()
}
