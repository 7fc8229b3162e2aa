//! OTP password-reset workflow.
//!
//! A reset row moves `CREATED -> VERIFIED -> USED`. Expired rows are dead and
//! a new request for the same account deletes any unused row. Wrong, reused
//! and already-verified codes all surface as [`ResetError::InvalidCode`].

pub mod otp;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::password;
use crate::clock::Clock;
use crate::email::NotificationSender;
use crate::models::PasswordReset;
use crate::store::{AccountStore, ResetStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),
    #[error("No account found with this email")]
    NotFound,
    #[error("Invalid OTP")]
    InvalidCode,
    #[error("OTP has expired. Please request a new one.")]
    Expired,
    #[error("OTP delivery failed: {0}")]
    Delivery(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct ResetPolicy {
    pub otp_ttl: Duration,
    pub min_password_length: usize,
}

pub struct PasswordResetService {
    accounts: Arc<dyn AccountStore>,
    resets: Arc<dyn ResetStore>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    policy: ResetPolicy,
}

impl PasswordResetService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        resets: Arc<dyn ResetStore>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        policy: ResetPolicy,
    ) -> Self {
        Self {
            accounts,
            resets,
            notifier,
            clock,
            policy,
        }
    }

    /// Issue a fresh OTP for the account behind `email`, invalidating any
    /// earlier unused one, and send it. On `Delivery` the row already exists.
    pub async fn request_reset(&self, email: &str) -> Result<PasswordReset, ResetError> {
        if email.trim().is_empty() {
            return Err(ResetError::Validation("Email is required"));
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await?
            .ok_or(ResetError::NotFound)?;

        let now = self.clock.now();
        let reset = PasswordReset {
            id: Uuid::now_v7(),
            account_id: account.id,
            account_email: account.email.clone(),
            otp_code: otp::generate_otp(),
            verified: false,
            used: false,
            created_at: now,
            expires_at: now + self.policy.otp_ttl,
        };

        self.resets.replace_pending(&reset).await?;
        tracing::info!(account_id = %account.id, reset_id = %reset.id, "Password reset requested");

        self.notifier
            .send_otp(&account.email, &reset.otp_code, &account.name)
            .await
            .map_err(ResetError::Delivery)?;

        Ok(reset)
    }

    /// Mark the matching reset verified and return its id.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<Uuid, ResetError> {
        if email.is_empty() || code.is_empty() {
            return Err(ResetError::Validation("Email and OTP are required"));
        }

        let reset = self
            .resets
            .find_unused(email, code, false)
            .await?
            .ok_or(ResetError::InvalidCode)?;

        let now = self.clock.now();
        if reset.is_expired(now) {
            return Err(ResetError::Expired);
        }

        if !self.resets.mark_verified(reset.id, now).await? {
            return Err(self.lost_transition(&reset));
        }

        tracing::info!(reset_id = %reset.id, "Password reset OTP verified");
        Ok(reset.id)
    }

    /// Set a new password through a verified reset, consuming it.
    pub async fn consume_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        if email.is_empty() || code.is_empty() || new_password.is_empty() {
            return Err(ResetError::Validation(
                "Email, OTP, and new password are required",
            ));
        }

        if new_password.chars().count() < self.policy.min_password_length {
            return Err(ResetError::WeakPassword(self.policy.min_password_length));
        }

        let reset = self
            .resets
            .find_unused(email, code, true)
            .await?
            .ok_or(ResetError::InvalidCode)?;

        if reset.is_expired(self.clock.now()) {
            return Err(ResetError::Expired);
        }

        let password_hash = password::hash(new_password).map_err(ResetError::Internal)?;

        // Re-read the clock: hashing is slow and expiry is checked again atomically.
        if !self
            .resets
            .consume(reset.id, &password_hash, self.clock.now())
            .await?
        {
            return Err(self.lost_transition(&reset));
        }

        tracing::info!(
            account_id = %reset.account_id,
            reset_id = %reset.id,
            "Password reset completed"
        );
        Ok(())
    }

    /// A conditional update matched nothing: either the row expired in the
    /// meantime or a concurrent call already moved it on.
    fn lost_transition(&self, reset: &PasswordReset) -> ResetError {
        if reset.is_expired(self.clock.now()) {
            ResetError::Expired
        } else {
            ResetError::InvalidCode
        }
    }

    /// Delete resets that expired before `now - retention`.
    pub async fn purge_expired(&self, retention: Duration) -> Result<u64, ResetError> {
        let cutoff: DateTime<Utc> = self.clock.now() - retention;
        Ok(self.resets.purge_expired(cutoff).await?)
    }
}
