pub mod config;
pub mod error;
pub mod state;
pub mod auth;
pub mod clock;
pub mod db;
pub mod models;
pub mod routes;
pub mod email;
pub mod rate_limit;
pub mod reset;
pub mod store;
pub mod sweeper;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::PgPool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::email::{LogSender, NotificationSender, SmtpSender};
use crate::rate_limit::{FailureLimiter, ResetRequestLimiter};
use crate::reset::{PasswordResetService, ResetPolicy};
use crate::state::{AppState, SharedState};
use crate::store::{AccountStore, PgStore, ResetStore};

/// Wire the Postgres-backed stores and the configured mailer into a router.
pub fn build_app(pool: PgPool, config: Config) -> (Router, SharedState) {
    let store = Arc::new(PgStore::new(pool));

    let notifier: Arc<dyn NotificationSender> = match config.smtp.as_ref() {
        Some(smtp) => match SmtpSender::new(smtp, config.otp_ttl_minutes) {
            Ok(sender) => {
                tracing::info!("SMTP configured");
                Arc::new(sender)
            }
            Err(e) => {
                tracing::warn!("SMTP not available, OTPs will only be logged: {e}");
                Arc::new(LogSender)
            }
        },
        None => Arc::new(LogSender),
    };

    let state = build_state(config, store.clone(), store, notifier, Arc::new(SystemClock));
    (router(state.clone()), state)
}

pub fn build_state(
    config: Config,
    accounts: Arc<dyn AccountStore>,
    resets: Arc<dyn ResetStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
) -> SharedState {
    let policy = ResetPolicy {
        otp_ttl: chrono::Duration::minutes(config.otp_ttl_minutes),
        min_password_length: config.min_password_length,
    };

    Arc::new(AppState {
        resets: PasswordResetService::new(accounts.clone(), resets, notifier, clock, policy),
        accounts,
        config,
        reset_request_limiter: ResetRequestLimiter::new(),
        otp_attempt_limiter: FailureLimiter::otp(),
        login_limiter: FailureLimiter::login(),
    })
}

pub fn router(state: SharedState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
