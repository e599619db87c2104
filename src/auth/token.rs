//! Issuing and verifying the signed credentials used for authentication.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, error::INVALID_TOKEN_MESSAGE, user::UserID};

/// The keys for signing and verifying credentials, derived from a server-held secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create the signing and verification keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The contents of a credential.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The user the credential was issued to.
    pub sub: UserID,
    /// When the credential was issued, as a unix timestamp.
    pub iat: i64,
    /// When the credential expires, as a unix timestamp.
    pub exp: i64,
}

/// A freshly signed credential.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// The encoded credential.
    pub token: String,
    /// When the credential stops being accepted.
    pub expires_at: OffsetDateTime,
}

/// Sign a credential for `user_id` that is valid for `duration`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the credential could not be signed.
pub fn issue_token(
    user_id: UserID,
    duration: Duration,
    keys: &TokenKeys,
) -> Result<IssuedToken, Error> {
    let issued_at = OffsetDateTime::now_utc();
    let expires_at = issued_at + duration;

    let claims = Claims {
        sub: user_id,
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map(|token| IssuedToken { token, expires_at })
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns an [Error::Unauthenticated] if the credential is malformed, has a
/// bad signature or has expired.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected credential: {error}");
            Error::Unauthenticated(INVALID_TOKEN_MESSAGE)
        })
}
