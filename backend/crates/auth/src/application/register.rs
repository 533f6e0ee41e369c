//! Register Use Case
//!
//! Creates a principal for an email address whose ownership was just proven
//! with a one-time passcode.

use std::sync::Arc;

use kernel::id::PrincipalId;

use crate::application::verification_cache::VerificationCache;
use crate::domain::entity::principal::NewPrincipal;
use crate::domain::repository::{OtpDelivery, PrincipalRepository, SecretHasher};
use crate::domain::value_object::role::Role;
use crate::error::{AuthError, AuthResult};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 64;

pub struct RegisterInput {
    pub verification_token: String,
    pub code: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub principal_id: PrincipalId,
    pub email: String,
}

pub struct RegisterUseCase<R, D, H: ?Sized> {
    repo: Arc<R>,
    cache: Arc<VerificationCache<D>>,
    hasher: Arc<H>,
}

impl<R, D, H> RegisterUseCase<R, D, H>
where
    R: PrincipalRepository,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + ?Sized,
{
    pub fn new(repo: Arc<R>, cache: Arc<VerificationCache<D>>, hasher: Arc<H>) -> Self {
        Self {
            repo,
            cache,
            hasher,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Checked before the code is consumed so a bad password does not
        // cost the caller a fresh code.
        validate_password(&input.password)?;

        let email = self
            .cache
            .verify(&input.verification_token, &input.code)?
            .into_inner()
            .to_lowercase();

        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::PrincipalExists);
        }

        let principal = NewPrincipal {
            id: PrincipalId::new(),
            email,
            password_digest: self.hasher.hash(&input.password)?,
            role: Role::User,
        };
        self.repo.create(&principal).await?;

        tracing::info!(principal_id = %principal.id, "Principal registered");

        Ok(RegisterOutput {
            principal_id: principal.id,
            email: principal.email,
        })
    }
}

pub(crate) fn validate_password(password: &str) -> AuthResult<()> {
    let chars = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&chars) {
        return Err(AuthError::PasswordValidation(format!(
            "must be {MIN_PASSWORD_CHARS} to {MAX_PASSWORD_CHARS} characters"
        )));
    }
    if password.trim().is_empty() {
        return Err(AuthError::PasswordValidation(
            "must not be only whitespace".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::domain::repository::PrincipalRepository;
    use crate::test_support::{InMemoryRepository, PlainHasher, RecordingDelivery};

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        delivery: Arc<RecordingDelivery>,
        cache: Arc<VerificationCache<RecordingDelivery>>,
        use_case: RegisterUseCase<InMemoryRepository, RecordingDelivery, PlainHasher>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::default());
        let delivery = Arc::new(RecordingDelivery::default());
        let cache = Arc::new(VerificationCache::new(
            delivery.clone(),
            &AuthConfig::default(),
        ));
        let use_case = RegisterUseCase::new(repo.clone(), cache.clone(), Arc::new(PlainHasher));
        Fixture {
            repo,
            delivery,
            cache,
            use_case,
        }
    }

    async fn issue(f: &Fixture, address: &str) -> (String, String) {
        let token = f.cache.issue(address).await.unwrap();
        let (_, code) = f.delivery.last().unwrap();
        (token.to_string(), code)
    }

    #[tokio::test]
    async fn test_register_creates_user_principal() {
        let f = fixture();
        let (verification_token, code) = issue(&f, "New@Example.com").await;

        let output = f
            .use_case
            .execute(RegisterInput {
                verification_token,
                code,
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(output.email, "new@example.com");
        let credentials = f
            .repo
            .find_credentials("new@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.id, output.principal_id);
        assert_eq!(credentials.role, "user");
        assert_ne!(credentials.password_digest, "hunter22");
    }

    #[tokio::test]
    async fn test_register_rejects_existing_email() {
        let f = fixture();
        f.repo.insert_principal("taken@example.com", "user", "x");
        let (verification_token, code) = issue(&f, "taken@example.com").await;

        let result = f
            .use_case
            .execute(RegisterInput {
                verification_token,
                code,
                password: "hunter22".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::PrincipalExists)));
    }

    #[tokio::test]
    async fn test_bad_password_keeps_code() {
        let f = fixture();
        let (verification_token, code) = issue(&f, "a@example.com").await;

        let result = f
            .use_case
            .execute(RegisterInput {
                verification_token: verification_token.clone(),
                code: code.clone(),
                password: "short".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::PasswordValidation(_))));
        assert_eq!(f.cache.len(), 1);

        let result = f
            .use_case
            .execute(RegisterInput {
                verification_token,
                code,
                password: "long enough".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_code() {
        let f = fixture();
        let (verification_token, code) = issue(&f, "a@example.com").await;
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let result = f
            .use_case
            .execute(RegisterInput {
                verification_token,
                code: wrong.to_string(),
                password: "hunter22".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::Mismatch)));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"x".repeat(64)).is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password(&"x".repeat(65)).is_err());
        assert!(validate_password("        ").is_err());
        // Counted in characters, not bytes
        assert!(validate_password("ääääää").is_ok());
    }
}
