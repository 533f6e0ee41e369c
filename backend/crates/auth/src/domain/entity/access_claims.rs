//! Access Token Claims
//!
//! The payload of a signed access token. Immutable once signed; never
//! persisted. Claims are only meaningful after the signature has been
//! checked by the token issuer.

use chrono::{DateTime, Duration, Utc};
use kernel::id::PrincipalId;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal UUID
    pub sub: String,
    /// Role code as it was when the token was minted
    pub role: String,
    pub iss: String,
    /// Unix seconds
    pub iat: i64,
    /// Unix seconds
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(
        principal_id: &PrincipalId,
        role: &str,
        issuer: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            sub: principal_id.to_string(),
            role: role.to_owned(),
            iss: issuer.to_owned(),
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
        }
    }

    /// A signed `sub` that is not a UUID is treated like a forged token.
    pub fn principal_id(&self) -> AuthResult<PrincipalId> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}
