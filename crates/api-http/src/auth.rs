//! Access token verification (HS256)
//!
//! Tokens are issued by the account service; this crate only verifies them.
//! The `id` claim carries the user id.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use playlist_export_core::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id of the bearer
    pub id: String,
    /// Expiry, seconds since epoch
    pub exp: u64,
}

#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 5; // clock skew

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry; failures are `Authentication`
    pub fn decode_access_token(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Authentication(format!("Invalid access token: {}", e)))?;

        if data.claims.id.is_empty() {
            return Err(AppError::Authentication(
                "Access token carries no user id".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

/// Sign an access token with the shared key (dev tooling and tests)
pub fn issue_access_token(secret: &str, user_id: &str, exp: u64) -> Result<String, AppError> {
    let claims = AccessTokenClaims {
        id: user_id.to_string(),
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))
}
