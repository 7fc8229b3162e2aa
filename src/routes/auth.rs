use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password;
use crate::error::AppError;
use crate::models::account::DEFAULT_ROLE;
use crate::models::NewAccount;
use crate::state::SharedState;
use crate::store::StoreError;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user: AccountSummary,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: AccountSummary,
}

#[derive(Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("All fields are required".to_string()));
    }

    let domain = email_domain(&req.email)
        .filter(|d| state.config.allowed_domains.iter().any(|a| a == d))
        .ok_or_else(|| {
            AppError::BadRequest("Only company email addresses are allowed".to_string())
        })?;

    password::check_strength(&req.password).map_err(|msg| AppError::BadRequest(msg.to_string()))?;

    if state.accounts.find_by_email(&req.email).await?.is_some() {
        return Err(duplicate_email());
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let account = state
        .accounts
        .create(NewAccount {
            name: req.name,
            email: req.email,
            password_hash: pw_hash,
            role: DEFAULT_ROLE.to_string(),
            company: Some(domain),
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent sign-up for the same email.
            StoreError::Conflict => duplicate_email(),
            other => other.into(),
        })?;

    tracing::info!(account_id = %account.id, "Account created");

    Ok(Json(SignupResponse {
        success: true,
        message: "Account created successfully".to_string(),
        user: AccountSummary {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        },
    }))
}

/// Check email and password. Every failure looks the same to the caller.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(invalid_credentials());
    }

    if state.login_limiter.try_acquire(&req.email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let account = match state.accounts.find_by_email(&req.email).await {
        Ok(Some(account)) => account,
        Ok(None) => return Err(invalid_credentials()),
        Err(e) => {
            state.login_limiter.release(&req.email);
            return Err(e.into());
        }
    };

    let valid = password::verify(&req.password, &account.password_hash).map_err(|e| {
        state.login_limiter.release(&req.email);
        AppError::Internal(e)
    })?;

    if !valid {
        return Err(invalid_credentials());
    }

    state.login_limiter.release(&req.email);
    tracing::info!(account_id = %account.id, "Login succeeded");

    Ok(Json(LoginResponse {
        success: true,
        user: AccountSummary {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        },
    }))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

fn duplicate_email() -> AppError {
    AppError::BadRequest("User with this email already exists".to_string())
}

/// Lowercased part after the last `@`, if there is a non-empty one.
fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_lowercase())
        .filter(|domain| !domain.is_empty())
}
