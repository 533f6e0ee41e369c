//! Verification Cache
//!
//! In-memory store of pending one-time passcodes keyed by an opaque
//! verification token.
//!
//! Every mutation happens inside one short synchronous critical section, so
//! concurrent callers on the same token see exactly one winner and a dropped
//! future can never leave a record half-consumed. Delivery (network I/O) is
//! always performed outside the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::config::AuthConfig;
use crate::domain::entity::verification_record::VerificationRecord;
use crate::domain::repository::OtpDelivery;
use crate::domain::value_object::{otp_code::OtpCode, verification_token::VerificationToken};
use crate::error::{AuthError, AuthResult};

/// The address a successfully verified code had been sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAddress(String);

impl VerifiedAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

pub struct VerificationCache<D> {
    records: Mutex<HashMap<VerificationToken, VerificationRecord>>,
    delivery: Arc<D>,
    expiry: Duration,
    resend_cooldown: Duration,
    code_length: usize,
}

impl<D> VerificationCache<D> {
    pub fn new(delivery: Arc<D>, config: &AuthConfig) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            delivery,
            expiry: config.otp_expiry,
            resend_cooldown: config.otp_resend_cooldown,
            code_length: config.otp_code_length,
        }
    }

    // A panic while holding the guard cannot corrupt the map: every
    // critical section is a single insert, remove or retain.
    fn lock(&self) -> MutexGuard<'_, HashMap<VerificationToken, VerificationRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, token: VerificationToken, record: VerificationRecord) -> usize {
        let mut records = self.lock();
        records.insert(token, record);
        records.len()
    }

    /// Check `code` against the record for `token`.
    ///
    /// - unknown or consumed token: `NotFound`
    /// - past the expiry window: `Expired`, and the record is dropped
    /// - wrong code: `Mismatch`, and the record is kept for another attempt
    /// - otherwise the record is consumed
    pub fn verify(&self, token: &str, code: &str) -> AuthResult<VerifiedAddress> {
        self.consume(token, code, None)
    }

    /// Like [`verify`](Self::verify), but the code must also have been sent
    /// to `address`. A code sent anywhere else is a `Mismatch` and is left
    /// untouched for its rightful owner.
    pub fn verify_for(&self, token: &str, code: &str, address: &str) -> AuthResult<VerifiedAddress> {
        self.consume(token, code, Some(address))
    }

    fn consume(&self, token: &str, code: &str, address: Option<&str>) -> AuthResult<VerifiedAddress> {
        let now = Instant::now();
        let mut records = self.lock();

        match records.get(token) {
            None => Err(AuthError::NotFound),
            Some(record) if record.is_expired(now, self.expiry) => {
                records.remove(token);
                Err(AuthError::Expired)
            }
            Some(record) if address.is_some_and(|a| !record.address.eq_ignore_ascii_case(a)) => {
                tracing::warn!("Verification code presented for a different address");
                Err(AuthError::Mismatch)
            }
            Some(record) if !record.code.matches(code) => Err(AuthError::Mismatch),
            Some(_) => records
                .remove(token)
                .map(|record| VerifiedAddress(record.address))
                .ok_or(AuthError::NotFound),
        }
    }

    /// Remove the record for `token` if its resend cooldown has elapsed.
    fn take_for_resend(&self, token: &str) -> AuthResult<()> {
        let now = Instant::now();
        let mut records = self.lock();

        let remaining = records
            .get(token)
            .ok_or(AuthError::NotFound)?
            .resend_remaining(now, self.resend_cooldown);

        match remaining {
            Some(remaining) => Err(AuthError::TooSoon { remaining }),
            None => {
                records.remove(token);
                Ok(())
            }
        }
    }

    /// Drop every record older than the expiry window. Returns how many.
    pub fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now, self.expiry));
        before - records.len()
    }

    /// Number of pending records
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<D> VerificationCache<D>
where
    D: OtpDelivery + Send + Sync + 'static,
{
    /// Generate a code, deliver it to `address`, then remember it.
    ///
    /// Nothing is stored when delivery fails.
    pub async fn issue(&self, address: &str) -> AuthResult<VerificationToken> {
        let code = OtpCode::generate(self.code_length);
        self.delivery.deliver(address, &code).await?;

        let token = VerificationToken::generate();
        let pending = self.store(
            token.clone(),
            VerificationRecord::new(code, address, Instant::now()),
        );

        tracing::info!(pending, "Verification code issued");
        Ok(token)
    }

    /// Replace the record for `token` with a fresh code sent to `address`.
    ///
    /// The old record is consumed before delivery; if delivery fails the
    /// caller has to start over with [`issue`](Self::issue).
    pub async fn resend(&self, token: &str, address: &str) -> AuthResult<VerificationToken> {
        self.take_for_resend(token)?;
        tracing::debug!("Verification record replaced for resend");
        self.issue(address).await
    }

    /// Run [`reap_expired`](Self::reap_expired) every `every` until `shutdown` fires.
    pub fn spawn_reaper(self: Arc<Self>, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Verification reaper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = self.reap_expired();
                        if removed > 0 {
                            tracing::debug!(removed, "Expired verification records reaped");
                        }
                    }
                }
            }
        })
    }
}
