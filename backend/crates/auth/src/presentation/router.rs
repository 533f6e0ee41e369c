//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::policy::{RouteAccessPolicy, RouteRule};
use crate::domain::repository::{OtpDelivery, SecretHasher};
use crate::domain::value_object::role::Role;
use crate::presentation::handlers::{self, AuthAppState, AuthStore};
use crate::presentation::middleware::require_session;

/// Create the Auth router
///
/// `/signout`, `/session` and `/account/*` sit behind [`require_session`];
/// the rest are open.
pub fn auth_router<R, D, H>(state: AuthAppState<R, D, H>) -> Router
where
    R: AuthStore,
    D: OtpDelivery + Send + Sync + 'static,
    H: SecretHasher + 'static,
{
    let protected = Router::new()
        .route("/signout", post(handlers::sign_out::<R, D, H>))
        .route("/session", get(handlers::session_status))
        .route("/account/email", post(handlers::update_email::<R, D, H>))
        .route("/account/password", post(handlers::update_password::<R, D, H>))
        .route("/account/remove", post(handlers::remove_account::<R, D, H>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<R, D, H>,
        ));

    Router::new()
        .route("/otp/send", post(handlers::send_otp::<R, D, H>))
        .route("/otp/resend", post(handlers::resend_otp::<R, D, H>))
        .route("/register", post(handlers::register::<R, D, H>))
        .route("/signin", post(handlers::sign_in::<R, D, H>))
        .merge(protected)
        .with_state(state)
}

/// Route table for [`auth_router`] mounted under `prefix`.
///
/// Credential endpoints are anonymous; every session endpoint admits `User`
/// (and therefore `Admin`). Signing out and the account mutations end the
/// session, so they never echo a renewed token.
pub fn auth_route_policy(prefix: &str) -> RouteAccessPolicy {
    let path = |suffix: &str| format!("{prefix}{suffix}");

    RouteAccessPolicy::new()
        .with_route(path("/otp/send"), RouteRule::anonymous())
        .with_route(path("/otp/resend"), RouteRule::anonymous())
        .with_route(path("/register"), RouteRule::anonymous())
        .with_route(path("/signin"), RouteRule::anonymous())
        .with_route(path("/session"), RouteRule::for_roles([Role::User]))
        .with_route(
            path("/signout"),
            RouteRule::for_roles([Role::User]).without_token_echo(),
        )
        .with_route(
            path("/account/email"),
            RouteRule::for_roles([Role::User]).without_token_echo(),
        )
        .with_route(
            path("/account/password"),
            RouteRule::for_roles([Role::User]).without_token_echo(),
        )
        .with_route(
            path("/account/remove"),
            RouteRule::for_roles([Role::User]).without_token_echo(),
        )
}
