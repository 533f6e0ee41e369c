//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use jsonwebtoken::Algorithm;

/// Key material for signing access tokens.
#[derive(Clone)]
pub enum SigningKey {
    /// Shared secret for HS256/384/512
    Hmac(Vec<u8>),
    /// PEM pair for RS*/PS*/ES*/EdDSA
    Pem { private: Vec<u8>, public: Vec<u8> },
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningKey::Hmac(_) => f.write_str("Hmac([REDACTED])"),
            SigningKey::Pem { .. } => f.write_str("Pem([REDACTED])"),
        }
    }
}

/// Where the authorization gate reads a principal's role from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleSource {
    /// Trust the role claim in the signed access token
    #[default]
    Token,
    /// Re-fetch the role from the principal store on every request
    Store,
}

impl FromStr for RoleSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(RoleSource::Token),
            "store" => Ok(RoleSource::Store),
            other => Err(format!("unknown role source: {other}")),
        }
    }
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// `iss` claim written into and required from every access token
    pub issuer: String,
    pub algorithm: Algorithm,
    pub signing_key: SigningKey,
    /// Access token lifetime (1 hour)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (60 days)
    pub refresh_token_ttl: Duration,
    /// How long an issued code stays verifiable (5 minutes)
    ///
    /// Must outlast `otp_resend_cooldown`, otherwise every record expires
    /// before a resend is allowed. A one-minute expiry therefore needs the
    /// cooldown lowered with it.
    pub otp_expiry: Duration,
    /// Minimum time between issuing a code and resending it (2 minutes)
    pub otp_resend_cooldown: Duration,
    pub otp_code_length: usize,
    /// How often expired verification records are swept
    pub reaper_interval: Duration,
    pub role_source: RoleSource,
    /// Response header carrying a silently renewed access token
    pub renewed_token_header: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            algorithm: Algorithm::HS512,
            signing_key: SigningKey::Hmac(Vec::new()),
            access_token_ttl: Duration::from_secs(3600), // 1 hour
            refresh_token_ttl: Duration::from_secs(60 * 24 * 3600), // 60 days
            otp_expiry: Duration::from_secs(5 * 60),
            otp_resend_cooldown: Duration::from_secs(2 * 60),
            otp_code_length: 6,
            reaper_interval: Duration::from_secs(60),
            role_source: RoleSource::Token,
            renewed_token_header: "x-access-token".to_string(),
            password_pepper: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("signing_key", &self.signing_key)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("otp_expiry", &self.otp_expiry)
            .field("otp_resend_cooldown", &self.otp_resend_cooldown)
            .field("otp_code_length", &self.otp_code_length)
            .field("reaper_interval", &self.reaper_interval)
            .field("role_source", &self.role_source)
            .field("renewed_token_header", &self.renewed_token_header)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthConfig {
    /// HMAC signing with the given shared secret
    pub fn with_hmac_secret(secret: Vec<u8>) -> Self {
        Self {
            signing_key: SigningKey::Hmac(secret),
            ..Default::default()
        }
    }

    /// Create config with a random signing secret (for development)
    ///
    /// Tokens do not survive a restart.
    pub fn development() -> Self {
        Self::with_hmac_secret(platform::crypto::random_bytes(64))
    }
}
