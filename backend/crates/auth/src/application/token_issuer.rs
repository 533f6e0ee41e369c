//! Token Issuer
//!
//! Mints signed access tokens (compact JWS) and opaque refresh tokens, and
//! checks the signature of access tokens presented back to us.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use kernel::id::PrincipalId;
use platform::crypto::{random_bytes, to_hex};

use crate::application::config::{AuthConfig, SigningKey};
use crate::domain::entity::{access_claims::AccessClaims, refresh_token::RefreshToken};
use crate::error::{AuthError, AuthResult};

const REFRESH_TOKEN_BYTES: usize = 32;

pub struct TokenIssuer {
    issuer: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    refresh_ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let (encoding_key, decoding_key) = load_keys(config.algorithm, &config.signing_key)?;

        // Expiry is judged by the session validator, which needs to see
        // expired-but-authentic claims to decide on renewal.
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);

        let refresh_ttl = chrono::Duration::from_std(config.refresh_token_ttl)
            .map_err(|e| AuthError::Internal(format!("refresh token ttl out of range: {e}")))?;

        Ok(Self {
            issuer: config.issuer.clone(),
            algorithm: config.algorithm,
            encoding_key,
            decoding_key,
            validation,
            refresh_ttl,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign `{sub, role, iat: now, exp: now + lifetime, iss}`.
    pub fn mint_access_token(
        &self,
        principal_id: &PrincipalId,
        role: &str,
        lifetime: Duration,
    ) -> AuthResult<String> {
        let lifetime = chrono::Duration::from_std(lifetime)
            .map_err(|e| AuthError::Signing(format!("lifetime out of range: {e}")))?;
        let claims = AccessClaims::new(principal_id, role, &self.issuer, Utc::now(), lifetime);
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &AccessClaims) -> AuthResult<String> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and issuer. Expiry is *not* checked.
    pub fn decode(&self, raw: &str) -> AuthResult<AccessClaims> {
        jsonwebtoken::decode::<AccessClaims>(raw, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Access token rejected");
                AuthError::Malformed
            })
    }

    /// 256 random bits, hex encoded, expiring `refresh_token_ttl` from now.
    pub fn mint_refresh_token(&self) -> RefreshToken {
        RefreshToken::new(
            to_hex(&random_bytes(REFRESH_TOKEN_BYTES)),
            Utc::now() + self.refresh_ttl,
        )
    }
}

fn load_keys(algorithm: Algorithm, key: &SigningKey) -> AuthResult<(EncodingKey, DecodingKey)> {
    use Algorithm::*;

    let signing = |e: jsonwebtoken::errors::Error| AuthError::Signing(e.to_string());

    match (algorithm, key) {
        (HS256 | HS384 | HS512, SigningKey::Hmac(secret)) if !secret.is_empty() => Ok((
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )),
        (RS256 | RS384 | RS512 | PS256 | PS384 | PS512, SigningKey::Pem { private, public }) => Ok((
            EncodingKey::from_rsa_pem(private).map_err(signing)?,
            DecodingKey::from_rsa_pem(public).map_err(signing)?,
        )),
        (ES256 | ES384, SigningKey::Pem { private, public }) => Ok((
            EncodingKey::from_ec_pem(private).map_err(signing)?,
            DecodingKey::from_ec_pem(public).map_err(signing)?,
        )),
        (EdDSA, SigningKey::Pem { private, public }) => Ok((
            EncodingKey::from_ed_pem(private).map_err(signing)?,
            DecodingKey::from_ed_pem(public).map_err(signing)?,
        )),
        (algorithm, _) => Err(AuthError::Signing(format!(
            "no usable key material for {algorithm:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn test_mint_then_decode() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let id = PrincipalId::new();

        let token = issuer
            .mint_access_token(&id, "admin", Duration::from_secs(3600))
            .unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.principal_id().unwrap(), id);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, issuer.issuer());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_decode_accepts_expired_claims() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let now = Utc::now();
        let claims = AccessClaims::new(
            &PrincipalId::new(),
            "user",
            issuer.issuer(),
            now - chrono::Duration::hours(3),
            chrono::Duration::hours(1),
        );

        let decoded = issuer.decode(&issuer.sign(&claims).unwrap()).unwrap();
        assert!(decoded.is_expired_at(now));
    }

    #[test]
    fn test_decode_rejects_foreign_signature() {
        let ours = TokenIssuer::new(&test_config()).unwrap();
        let theirs = TokenIssuer::new(&AuthConfig::with_hmac_secret(b"another-secret".to_vec()))
            .unwrap();

        let forged = theirs
            .mint_access_token(&PrincipalId::new(), "admin", Duration::from_secs(60))
            .unwrap();
        assert!(matches!(ours.decode(&forged), Err(AuthError::Malformed)));
    }

    #[test]
    fn test_decode_rejects_other_issuer() {
        let ours = TokenIssuer::new(&test_config()).unwrap();
        let other = TokenIssuer::new(&AuthConfig {
            issuer: "https://elsewhere.example".to_string(),
            ..test_config()
        })
        .unwrap();

        let token = other
            .mint_access_token(&PrincipalId::new(), "user", Duration::from_secs(60))
            .unwrap();
        assert!(matches!(ours.decode(&token), Err(AuthError::Malformed)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        for raw in ["", "abc", "a.b.c", "eyJhbGciOiJub25lIn0.e30."] {
            assert!(matches!(issuer.decode(raw), Err(AuthError::Malformed)));
        }
    }

    #[test]
    fn test_key_algorithm_mismatch() {
        let config = AuthConfig {
            algorithm: Algorithm::RS256,
            ..test_config()
        };
        assert!(matches!(
            TokenIssuer::new(&config),
            Err(AuthError::Signing(_))
        ));

        let empty = AuthConfig::with_hmac_secret(Vec::new());
        assert!(matches!(
            TokenIssuer::new(&empty),
            Err(AuthError::Signing(_))
        ));
    }

    #[test]
    fn test_refresh_token() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let a = issuer.mint_refresh_token();
        let b = issuer.mint_refresh_token();

        assert_eq!(a.token.len(), 64);
        assert!(a.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);

        let days = (a.expires_at - Utc::now()).num_days();
        assert!((59..=60).contains(&days));
    }
}
