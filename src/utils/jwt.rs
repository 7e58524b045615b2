// src/utils/jwt.rs

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The claims the client cares about in an access token.
/// Every field is optional since the token format belongs to the server.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Claims {
    /// Subject - the user id, when the server puts it there.
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration time as Unix timestamp.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Reads the claims of a JWT without verifying its signature.
///
/// The client never holds the signing secret; the server stays the judge of
/// validity. This is only used to spot a token that has plainly expired.
pub fn peek_claims(token: &str) -> Result<Claims, AppError> {
    let header = decode_header(token)
        .map_err(|e| AppError::AuthError(format!("Access token is not a JWT: {}", e)))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AppError::AuthError(format!("Unreadable access token: {}", e)))?;

    Ok(token_data.claims)
}

/// Returns true when the claims carry an `exp` at or before `now` (Unix seconds).
pub fn is_expired(claims: &Claims, now: i64) -> bool {
    matches!(claims.exp, Some(exp) if exp <= now)
}
