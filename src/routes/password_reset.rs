use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::reset::ResetError;
use crate::state::SharedState;

// Missing fields deserialize as empty strings so they surface as 400s, not 422s.

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    pub reset_id: Uuid,
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if req.email.trim().is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    if state.reset_request_limiter.check(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many reset requests. Please try again later.".to_string(),
        ));
    }

    state.resets.request_reset(&req.email).await?;

    Ok(Json(SuccessResponse::new("OTP sent to your email")))
}

pub async fn verify_otp(
    State(state): State<SharedState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    acquire_attempt(&state, &req.email)?;

    match state.resets.verify_otp(&req.email, &req.otp).await {
        Ok(reset_id) => {
            state.otp_attempt_limiter.release(&req.email);
            Ok(Json(VerifyOtpResponse {
                success: true,
                message: "OTP verified successfully".to_string(),
                reset_id,
            }))
        }
        // The reserved attempt stays spent.
        Err(ResetError::InvalidCode) => Err(AppError::BadRequest("Invalid OTP".to_string())),
        Err(e) => {
            state.otp_attempt_limiter.release(&req.email);
            Err(e.into())
        }
    }
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    acquire_attempt(&state, &req.email)?;

    match state
        .resets
        .consume_reset(&req.email, &req.otp, &req.new_password)
        .await
    {
        Ok(()) => {
            state.otp_attempt_limiter.release(&req.email);
            Ok(Json(SuccessResponse::new("Password reset successfully")))
        }
        Err(ResetError::InvalidCode) => {
            Err(AppError::BadRequest("Invalid or unverified OTP".to_string()))
        }
        Err(e) => {
            state.otp_attempt_limiter.release(&req.email);
            Err(e.into())
        }
    }
}

/// Reserve one OTP attempt for `email`; the caller refunds it unless the code was wrong.
fn acquire_attempt(state: &SharedState, email: &str) -> Result<(), AppError> {
    state.otp_attempt_limiter.try_acquire(email).map_err(|_| {
        AppError::RateLimited("Too many failed attempts. Please try again later.".to_string())
    })
}
