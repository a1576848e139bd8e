//! SQL layer for the refresh-token registry.
//!
//! Revocation is a tombstone (`revoked_at`), never a delete, so a replayed
//! rotated token is distinguishable from one that never existed. The
//! `token_cleanup` binary purges dead rows out of band.

use chrono::{DateTime, Utc};

use crate::{
    db::connection::DbPool, error::AppError, models::refresh_token::RefreshTokenRecord,
};

pub async fn insert(pool: &DbPool, record: &RefreshTokenRecord) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, revoked_at, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.token_hash)
    .bind(record.expires_at)
    .bind(record.revoked_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// All unrevoked, unexpired records. The registry compares the presented raw
/// token against each candidate hash; a salted hash rules out lookup by value.
pub async fn list_active(
    pool: &DbPool,
    now: DateTime<Utc>,
) -> Result<Vec<RefreshTokenRecord>, AppError> {
    let records = sqlx::query_as::<_, RefreshTokenRecord>(
        "SELECT id, user_id, token_hash, expires_at, revoked_at FROM refresh_tokens \
         WHERE revoked_at IS NULL AND expires_at > ?",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

pub async fn revoke(pool: &DbPool, record_id: &str, now: DateTime<Utc>) -> Result<(), AppError> {
    sqlx::query("UPDATE refresh_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
        .bind(now)
        .bind(record_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Revokes every active record owned by the user ("log out of all devices").
pub async fn revoke_all_for_user(
    pool: &DbPool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
    )
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn count_active_for_user(
    pool: &DbPool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM refresh_tokens \
         WHERE user_id = ? AND revoked_at IS NULL AND expires_at > ?",
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Deletes expired and revoked rows; used by the cleanup binary.
pub async fn purge_stale(pool: &DbPool, now: DateTime<Utc>) -> Result<u64, AppError> {
    let result =
        sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ? OR revoked_at IS NOT NULL")
            .bind(now)
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}
