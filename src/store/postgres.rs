use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{Account, NewAccount, PasswordReset};

use super::{AccountStore, ResetStore, StoreError};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(db::accounts::find_by_email(&self.pool, email).await?)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        Ok(db::accounts::create(&self.pool, &account).await?)
    }
}

#[async_trait]
impl ResetStore for PgStore {
    async fn replace_pending(&self, reset: &PasswordReset) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        db::password_resets::lock_account(&mut *tx, reset.account_id).await?;

        let invalidated =
            db::password_resets::delete_unused_for_account(&mut *tx, reset.account_id).await?;
        db::password_resets::create(&mut *tx, reset).await?;

        tx.commit().await?;

        if invalidated > 0 {
            tracing::debug!(
                account_id = %reset.account_id,
                invalidated,
                "Invalidated earlier password resets"
            );
        }
        Ok(())
    }

    async fn find_unused(
        &self,
        email: &str,
        otp_code: &str,
        verified: bool,
    ) -> Result<Option<PasswordReset>, StoreError> {
        Ok(db::password_resets::find_unused(&self.pool, email, otp_code, verified).await?)
    }

    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(db::password_resets::mark_verified(&self.pool, id, now).await?)
    }

    async fn consume(
        &self,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(account_id) = db::password_resets::mark_used(&mut *tx, id, now).await? else {
            return Ok(false);
        };

        if !db::accounts::update_password(&mut *tx, account_id, password_hash).await? {
            // Dropping the transaction rolls back the `used` flag.
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(db::password_resets::delete_expired_before(&self.pool, cutoff).await?)
    }
}
