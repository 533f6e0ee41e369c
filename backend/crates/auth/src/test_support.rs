//! In-memory collaborators for unit and router tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use kernel::id::PrincipalId;

use crate::application::config::AuthConfig;
use crate::domain::entity::principal::{NewPrincipal, PrincipalCredentials};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{
    OtpDelivery, PrincipalRepository, RefreshTokenRepository, SecretHasher,
};
use crate::domain::value_object::otp_code::OtpCode;
use crate::error::{AuthError, AuthResult};

pub const TEST_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

pub fn test_config() -> AuthConfig {
    AuthConfig::with_hmac_secret(TEST_SECRET.to_vec())
}

#[derive(Debug, Clone)]
struct StoredPrincipal {
    id: PrincipalId,
    role: String,
    password_digest: String,
}

#[derive(Default)]
pub struct InMemoryRepository {
    principals: Mutex<HashMap<String, StoredPrincipal>>,
    refresh_tokens: Mutex<HashMap<PrincipalId, RefreshToken>>,
}

impl InMemoryRepository {
    pub fn insert_principal(&self, email: &str, role: &str, password_digest: &str) -> PrincipalId {
        let id = PrincipalId::new();
        self.principals.lock().unwrap().insert(
            email.to_owned(),
            StoredPrincipal {
                id,
                role: role.to_owned(),
                password_digest: password_digest.to_owned(),
            },
        );
        id
    }

    pub fn set_role(&self, id: &PrincipalId, role: &str) {
        let mut principals = self.principals.lock().unwrap();
        if let Some(p) = principals.values_mut().find(|p| p.id == *id) {
            p.role = role.to_owned();
        }
    }

    pub fn email_of(&self, id: &PrincipalId) -> Option<String> {
        self.principals
            .lock()
            .unwrap()
            .iter()
            .find(|(_, p)| p.id == *id)
            .map(|(email, _)| email.clone())
    }

    pub fn password_digest_of(&self, id: &PrincipalId) -> Option<String> {
        self.principals
            .lock()
            .unwrap()
            .values()
            .find(|p| p.id == *id)
            .map(|p| p.password_digest.clone())
    }

    pub fn refresh_token_value(&self, id: &PrincipalId) -> Option<String> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .get(id)
            .map(|t| t.token.clone())
    }

    pub fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.lock().unwrap().len()
    }
}

impl PrincipalRepository for InMemoryRepository {
    async fn lookup_principal_role(&self, id: &PrincipalId) -> AuthResult<Option<String>> {
        Ok(self
            .principals
            .lock()
            .unwrap()
            .values()
            .find(|p| p.id == *id)
            .map(|p| p.role.clone()))
    }

    async fn find_credentials(&self, email: &str) -> AuthResult<Option<PrincipalCredentials>> {
        Ok(self
            .principals
            .lock()
            .unwrap()
            .get(email)
            .map(|p| PrincipalCredentials {
                id: p.id,
                role: p.role.clone(),
                password_digest: p.password_digest.clone(),
            }))
    }

    async fn exists_by_email(&self, email: &str) -> AuthResult<bool> {
        Ok(self.principals.lock().unwrap().contains_key(email))
    }

    async fn create(&self, principal: &NewPrincipal) -> AuthResult<()> {
        self.principals.lock().unwrap().insert(
            principal.email.clone(),
            StoredPrincipal {
                id: principal.id,
                role: principal.role.code().to_owned(),
                password_digest: principal.password_digest.clone(),
            },
        );
        Ok(())
    }

    async fn find_email(&self, id: &PrincipalId) -> AuthResult<Option<String>> {
        Ok(self.email_of(id))
    }

    async fn update_email(&self, id: &PrincipalId, email: &str) -> AuthResult<u64> {
        let mut principals = self.principals.lock().unwrap();
        if principals.contains_key(email) {
            return Err(AuthError::PrincipalExists);
        }
        let Some(old) = principals
            .iter()
            .find(|(_, p)| p.id == *id)
            .map(|(email, _)| email.clone())
        else {
            return Ok(0);
        };
        let stored = principals.remove(&old).unwrap();
        principals.insert(email.to_owned(), stored);
        Ok(1)
    }

    async fn update_password(&self, id: &PrincipalId, password_digest: &str) -> AuthResult<u64> {
        let mut principals = self.principals.lock().unwrap();
        match principals.values_mut().find(|p| p.id == *id) {
            Some(p) => {
                p.password_digest = password_digest.to_owned();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: &PrincipalId) -> AuthResult<u64> {
        let mut principals = self.principals.lock().unwrap();
        let before = principals.len();
        principals.retain(|_, p| p.id != *id);
        Ok((before - principals.len()) as u64)
    }
}

impl RefreshTokenRepository for InMemoryRepository {
    async fn get_refresh_token_expiry(
        &self,
        id: &PrincipalId,
    ) -> AuthResult<Option<DateTime<Utc>>> {
        Ok(self
            .refresh_tokens
            .lock()
            .unwrap()
            .get(id)
            .map(|t| t.expires_at))
    }

    async fn upsert_refresh_token(&self, id: &PrincipalId, token: &RefreshToken) -> AuthResult<()> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(*id, token.clone());
        Ok(())
    }

    async fn delete_refresh_token(&self, id: &PrincipalId) -> AuthResult<u64> {
        Ok(self.refresh_tokens.lock().unwrap().remove(id).map_or(0, |_| 1))
    }
}

/// Records every (address, code) it is asked to deliver. Can be switched
/// to fail mid-test to model a relay going down.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingDelivery {
    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn last(&self) -> Option<(String, String)> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl OtpDelivery for RecordingDelivery {
    async fn deliver(&self, address: &str, code: &OtpCode) -> AuthResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::Delivery("relay unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_owned(), code.as_str().to_owned()));
        Ok(())
    }
}

pub struct FailingDelivery;

impl OtpDelivery for FailingDelivery {
    async fn deliver(&self, _address: &str, _code: &OtpCode) -> AuthResult<()> {
        Err(AuthError::Delivery("relay unavailable".to_string()))
    }
}

/// Reversible stand-in for Argon2 so tests stay fast.
pub struct PlainHasher;

impl PlainHasher {
    pub fn digest(secret: &str) -> String {
        format!("plain${secret}")
    }
}

impl SecretHasher for PlainHasher {
    fn hash(&self, secret: &str) -> AuthResult<String> {
        Ok(Self::digest(secret))
    }

    fn verify(&self, secret: &str, digest: &str) -> AuthResult<bool> {
        Ok(Self::digest(secret) == digest)
    }
}
