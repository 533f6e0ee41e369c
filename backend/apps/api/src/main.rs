//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are rendered
//! by the auth crate through `kernel::error::AppError`.

mod routes;
mod settings;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use auth::{AuthAppState, PgAuthRepository, SmtpOtpDelivery, VerificationCache, auth_router};
use axum::{
    Router,
    http::{HeaderName, Method, header},
};
use platform::mail::SmtpMailer;
use platform::password::Argon2Hasher;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::routes::{AUTH_PREFIX, load_route_policy};
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await
        .context("connecting to database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: remove expired refresh tokens
    // Errors here should not prevent server startup
    let repo = PgAuthRepository::new(pool.clone());
    if let Err(e) = repo.cleanup_expired_refresh_tokens().await {
        tracing::warn!(
            error = %e,
            "Refresh token cleanup failed, continuing anyway"
        );
    }

    // Verification codes go out by mail; records live in memory only
    let mailer = SmtpMailer::new(&settings.smtp).context("configuring SMTP relay")?;
    let cache = Arc::new(VerificationCache::new(
        Arc::new(SmtpOtpDelivery::new(mailer)),
        &settings.auth,
    ));

    let shutdown = CancellationToken::new();
    let reaper = cache
        .clone()
        .spawn_reaper(settings.auth.reaper_interval, shutdown.clone());

    let policy = load_route_policy(settings.route_policy_path.as_deref())?;
    let renewed_token_header = HeaderName::try_from(settings.auth.renewed_token_header.as_str())
        .context("renewed token header name")?;
    let hasher = Arc::new(Argon2Hasher::new(settings.auth.password_pepper.clone()));

    let state = AuthAppState::new(Arc::new(repo), cache, hasher, settings.auth, policy)
        .context("building auth state")?;

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(settings.frontend_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .expose_headers(ExposeHeaders::list([
            renewed_token_header,
            header::RETRY_AFTER,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest(AUTH_PREFIX, auth_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    shutdown.cancel();
    reaper.await.context("verification reaper panicked")?;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        }
        _ = shutdown.cancelled() => {}
    }
    tracing::info!("Shutdown signal received");
}
