use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PasswordReset;

/// Serialize writers for one account until the surrounding transaction ends.
pub async fn lock_account<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::uuid::text, 0))")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete_unused_for_account<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    account_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_resets WHERE account_id = $1 AND used = false")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    reset: &PasswordReset,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO password_resets
            (id, account_id, account_email, otp_code, verified, used, created_at, expires_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(reset.id)
    .bind(reset.account_id)
    .bind(&reset.account_email)
    .bind(&reset.otp_code)
    .bind(reset.verified)
    .bind(reset.used)
    .bind(reset.created_at)
    .bind(reset.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Unused reset for this email and code in the given verification state.
pub async fn find_unused(
    pool: &PgPool,
    email: &str,
    otp_code: &str,
    verified: bool,
) -> Result<Option<PasswordReset>, sqlx::Error> {
    sqlx::query_as::<_, PasswordReset>(
        "SELECT * FROM password_resets
         WHERE account_email = $1 AND otp_code = $2 AND verified = $3 AND used = false
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(email)
    .bind(otp_code)
    .bind(verified)
    .fetch_optional(pool)
    .await
}

pub async fn mark_verified(
    pool: &PgPool,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE password_resets SET verified = true
         WHERE id = $1 AND verified = false AND used = false AND expires_at >= $2",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Flip `used` on a verified, unexpired reset. Returns the owning account when it matched.
pub async fn mark_used<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "UPDATE password_resets SET used = true
         WHERE id = $1 AND verified = true AND used = false AND expires_at >= $2
         RETURNING account_id",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub async fn delete_expired_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_resets WHERE expires_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
