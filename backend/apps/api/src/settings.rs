//! Process configuration, read once from the environment at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, RoleSource};
use axum::http::HeaderValue;
use base64::Engine;
use base64::engine::general_purpose;
use platform::mail::SmtpConfig;
use secrecy::SecretString;

const DEFAULT_PORT: u16 = 31113;
const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub frontend_origins: Vec<HeaderValue>,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    /// JSON route table replacing the built-in one
    pub route_policy_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;

        let port = match optional("PORT") {
            Some(port) => port.parse().context("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let frontend_origins = optional("FRONTEND_ORIGINS")
            .unwrap_or_else(|| "http://localhost:40922,http://127.0.0.1:40922".to_string())
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        Ok(Self {
            database_url,
            port,
            frontend_origins,
            auth: auth_config()?,
            smtp: smtp_config()?,
            route_policy_path: optional("ROUTE_POLICY_PATH").map(PathBuf::from),
        })
    }
}

fn auth_config() -> anyhow::Result<AuthConfig> {
    let mut config = match optional("ACCESS_TOKEN_SECRET") {
        Some(secret_b64) => {
            let secret = general_purpose::STANDARD
                .decode(secret_b64.trim())
                .context("ACCESS_TOKEN_SECRET must be base64")?;
            if secret.len() < 32 {
                bail!("ACCESS_TOKEN_SECRET must decode to at least 32 bytes");
            }
            AuthConfig::with_hmac_secret(secret)
        }
        None if cfg!(debug_assertions) => {
            tracing::warn!("ACCESS_TOKEN_SECRET not set, using a random development secret");
            AuthConfig::development()
        }
        None => bail!("ACCESS_TOKEN_SECRET must be set in production"),
    };

    if let Some(issuer) = optional("TOKEN_ISSUER") {
        config.issuer = issuer;
    }
    if let Some(source) = optional("ROLE_SOURCE") {
        config.role_source = source.parse::<RoleSource>().map_err(anyhow::Error::msg)?;
    }
    if let Some(pepper) = optional("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    Ok(config)
}

fn smtp_config() -> anyhow::Result<SmtpConfig> {
    let port = match optional("SMTP_PORT") {
        Some(port) => port.parse().context("SMTP_PORT must be a port number")?,
        None => DEFAULT_SMTP_PORT,
    };

    Ok(SmtpConfig {
        host: required("SMTP_HOST")?,
        port,
        username: required("SMTP_USERNAME")?,
        password: SecretString::from(required("SMTP_PASSWORD")?),
        from: required("FROM_EMAIL")?,
        timeout: SMTP_TIMEOUT,
    })
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set in environment"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
