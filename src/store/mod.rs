//! Persistence seams for accounts and password resets.
//!
//! Handlers and the reset workflow only see these traits; the process entry
//! point decides which implementation backs them.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, NewAccount, PasswordReset};

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict;
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
}

#[async_trait]
pub trait ResetStore: Send + Sync {
    /// Drop every unused reset of `reset.account_id` and insert `reset`.
    /// Concurrent calls for the same account must leave exactly one unused row.
    async fn replace_pending(&self, reset: &PasswordReset) -> Result<(), StoreError>;

    /// Unused reset matching `email` and `otp_code` whose `verified` flag equals `verified`.
    async fn find_unused(
        &self,
        email: &str,
        otp_code: &str,
        verified: bool,
    ) -> Result<Option<PasswordReset>, StoreError>;

    /// Returns false when the row was no longer unverified, unused and unexpired.
    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Mark a verified reset used and set the owning account's password hash,
    /// both or neither. Returns false when the row no longer qualified.
    async fn consume(
        &self,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
