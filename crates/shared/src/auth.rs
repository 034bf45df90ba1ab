//! Bearer token claims.
//!
//! The ledger only needs to know who is calling: `sub` is the owner id every
//! query is scoped to. Anything else the issuer puts in the token is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// Claims of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id.
    pub sub: Uuid,
    /// Unix time the token was minted.
    pub iat: i64,
    /// Unix time after which the token is rejected.
    pub exp: i64,
}

impl Claims {
    /// Claims for `owner`, minted now and valid until `expires_at`.
    #[must_use]
    pub fn new(owner: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: owner,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// The owner the request acts for.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}
