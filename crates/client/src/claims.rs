//! Unverified access-token claim inspection
//!
//! The client never verifies token signatures (that is the backend's job);
//! it only reads the expiry claim to decide whether a token is worth sending.
//! A token that cannot be decoded is treated as already expired.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use std::time::Duration;

/// Claim set of a StudyTailor access token
#[derive(Debug, Deserialize)]
pub struct AccessClaims {
    /// Expiration time (as UTC timestamp)
    pub exp: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
}

/// Decode a token's claims without verifying its signature
pub fn decode_unverified(token: &str) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // expiry is judged against the refresh threshold by the caller
    validation.validate_exp = false;

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
}

/// Check whether a token expires within `threshold` of `now`
///
/// Decode failures count as expired.
pub fn expires_within(token: &str, threshold: Duration, now: i64) -> bool {
    match decode_unverified(token) {
        Ok(claims) => claims.exp - now <= threshold.as_secs() as i64,
        Err(error) => {
            tracing::debug!(error = %error, "Access token could not be decoded, treating as expired");
            true
        }
    }
}
