pub mod auth;
pub mod password_reset;

use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        // Password reset
        .route(
            "/api/auth/forgot-password",
            post(password_reset::forgot_password),
        )
        .route("/api/auth/verify-otp", post(password_reset::verify_otp))
        .route(
            "/api/auth/reset-password",
            post(password_reset::reset_password),
        )
}
