//! Refresh-token registry: issuance, validation, and single-use rotation.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::Config,
    db::connection::DbPool,
    error::AppError,
    models::refresh_token::RefreshTokenRecord,
    repositories::refresh_tokens,
    utils::{hashing, jwt},
};

/// Outcome of a successful validation: which record matched, and whose it is.
#[derive(Debug)]
pub struct RefreshTokenMatch {
    pub user_id: String,
    pub record_id: String,
}

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues a fresh access+refresh pair for the user and registers the hashed
/// refresh token. Used by signup, login, and rotation.
pub async fn issue_session(
    pool: &DbPool,
    config: &Config,
    user_id: &str,
) -> Result<TokenPair, AppError> {
    let access_token =
        jwt::issue_access_token(user_id, &config.jwt_secret, config.access_token_ttl_minutes)?;
    let issued = jwt::issue_refresh_token(&config.jwt_secret, config.refresh_token_ttl_days)?;

    store(pool, user_id, &issued).await?;

    Ok(TokenPair {
        access_token,
        refresh_token: issued.token,
    })
}

/// Hashes the raw refresh token and persists the record. Raw tokens are never
/// written to the database.
pub async fn store(
    pool: &DbPool,
    user_id: &str,
    issued: &jwt::IssuedRefreshToken,
) -> Result<(), AppError> {
    let token_hash = hashing::hash_secret(&issued.token)?;
    let record = RefreshTokenRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        token_hash,
        expires_at: issued.expires_at,
        revoked_at: None,
    };

    refresh_tokens::insert(pool, &record).await
}

/// Checks signature, type, and expiry, then scans active records comparing
/// the raw token against each salted hash until one matches.
pub async fn validate(
    pool: &DbPool,
    config: &Config,
    raw_token: &str,
) -> Result<Option<RefreshTokenMatch>, AppError> {
    if jwt::verify_refresh_token(raw_token, &config.jwt_secret).is_err() {
        return Ok(None);
    }

    let records = refresh_tokens::list_active(pool, Utc::now()).await?;
    for record in records {
        if hashing::verify_secret(raw_token, &record.token_hash)? {
            return Ok(Some(RefreshTokenMatch {
                user_id: record.user_id,
                record_id: record.id,
            }));
        }
    }

    Ok(None)
}

/// The rotation protocol. Refresh tokens are single-use: the matched record
/// is revoked before the replacement pair is issued, so a crash between the
/// two steps loses the session rather than leaving two valid tokens.
pub async fn rotate(
    pool: &DbPool,
    config: &Config,
    raw_token: &str,
) -> Result<(String, TokenPair), AppError> {
    let matched = validate(pool, config, raw_token)
        .await?
        .ok_or(AppError::InvalidRefreshToken)?;

    refresh_tokens::revoke(pool, &matched.record_id, Utc::now()).await?;

    let pair = issue_session(pool, config, &matched.user_id).await?;
    Ok((matched.user_id, pair))
}

/// Revokes the record matching the presented token, if any. Returns whether a
/// record was revoked; an unmatched token is not an error (idempotent logout).
pub async fn revoke_presented(
    pool: &DbPool,
    config: &Config,
    raw_token: &str,
) -> Result<bool, AppError> {
    match validate(pool, config, raw_token).await? {
        Some(matched) => {
            refresh_tokens::revoke(pool, &matched.record_id, Utc::now()).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

pub async fn revoke_all_for_user(pool: &DbPool, user_id: &str) -> Result<u64, AppError> {
    refresh_tokens::revoke_all_for_user(pool, user_id, Utc::now()).await
}
