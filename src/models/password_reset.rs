use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One password-reset attempt. Rows are only ever mutated by flipping
/// `verified` and then `used`; `used` implies `verified`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PasswordReset {
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_email: String,
    #[serde(skip_serializing)]
    pub otp_code: String,
    pub verified: bool,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    /// The code stays usable up to and including `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
