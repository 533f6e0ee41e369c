//! Verification Record Entity
//!
//! A pending one-time passcode. Lives only inside the verification cache;
//! never persisted.

use std::time::Duration;

use tokio::time::Instant;

use crate::domain::value_object::otp_code::OtpCode;

#[derive(Debug, Clone)]
pub struct VerificationRecord {
    pub code: OtpCode,
    /// Where the code was delivered
    pub address: String,
    pub issued_at: Instant,
}

impl VerificationRecord {
    pub fn new(code: OtpCode, address: impl Into<String>, issued_at: Instant) -> Self {
        Self {
            code,
            address: address.into(),
            issued_at,
        }
    }

    /// Expired once strictly more than `window` has elapsed since issuance.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.issued_at) > window
    }

    /// Time left before a resend is allowed, or `None` if it already is.
    pub fn resend_remaining(&self, now: Instant, cooldown: Duration) -> Option<Duration> {
        let ready_at = self.issued_at + cooldown;
        (now < ready_at).then(|| ready_at - now)
    }
}
