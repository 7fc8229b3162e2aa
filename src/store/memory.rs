use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, NewAccount, PasswordReset};

use super::{AccountStore, ResetStore, StoreError};

/// Single-lock store for unit tests; every operation is trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    resets: Vec<PasswordReset>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resets(&self) -> Vec<PasswordReset> {
        self.inner.lock().unwrap().resets.clone()
    }

    pub fn account(&self, email: &str) -> Option<Account> {
        let inner = self.inner.lock().unwrap();
        inner.accounts.iter().find(|a| a.email == email).cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.account(email))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict);
        }
        let account = Account {
            id: Uuid::now_v7(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            role: account.role,
            company: account.company,
            created_at: Utc::now(),
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }
}

#[async_trait]
impl ResetStore for MemoryStore {
    async fn replace_pending(&self, reset: &PasswordReset) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .resets
            .retain(|r| r.account_id != reset.account_id || r.used);
        inner.resets.push(reset.clone());
        Ok(())
    }

    async fn find_unused(
        &self,
        email: &str,
        otp_code: &str,
        verified: bool,
    ) -> Result<Option<PasswordReset>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .resets
            .iter()
            .filter(|r| {
                r.account_email == email
                    && r.otp_code == otp_code
                    && r.verified == verified
                    && !r.used
            })
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn mark_verified(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.resets.iter_mut().find(|r| r.id == id) {
            Some(r) if !r.verified && !r.used && !r.is_expired(now) => {
                r.verified = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn consume(
        &self,
        id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        let Some(reset) = inner
            .resets
            .iter_mut()
            .find(|r| r.id == id && r.verified && !r.used && !r.is_expired(now))
        else {
            return Ok(false);
        };
        let Some(account) = inner.accounts.iter_mut().find(|a| a.id == reset.account_id) else {
            return Ok(false);
        };

        account.password_hash = password_hash.to_string();
        reset.used = true;
        Ok(true)
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.resets.len();
        inner.resets.retain(|r| r.expires_at >= cutoff);
        Ok((before - inner.resets.len()) as u64)
    }
}
