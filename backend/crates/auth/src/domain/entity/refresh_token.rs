//! Refresh Token Entity
//!
//! Opaque random value held server-side, one per principal. Its expiry is
//! what decides whether an expired access token may be renewed.

use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct RefreshToken {
    /// 256-bit random value, hex encoded
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
