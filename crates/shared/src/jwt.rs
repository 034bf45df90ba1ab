//! Bearer token verification.
//!
//! Access tokens are issued by the auth service and signed with a shared
//! HS256 secret; the ledger only verifies them. [`JwtService::issue`] exists
//! for tooling and tests that need a valid credential.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Claims;

/// Token settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret shared with the issuing service.
    pub secret: String,
    /// Lifetime of tokens minted by [`JwtService::issue`], in minutes.
    pub access_token_expires_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_minutes: 15,
        }
    }
}

/// Why a token was not accepted.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Signature valid, but `exp` is in the past.
    #[error("token has expired")]
    Expired,

    /// Malformed, forged, or missing required claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Signing a new token failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Verifies (and, for tooling, issues) HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("lifetime", &self.lifetime)
            .field("secret", &"[hidden]")
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Creates a service bound to the shared secret.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            lifetime: Duration::minutes(config.access_token_expires_minutes),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Checks the signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }

    /// Mints a token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, Utc::now() + self.lifetime);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }
}
