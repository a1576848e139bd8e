//! Token issuer: signed access and refresh tokens.
//!
//! Access tokens carry the user id in `sub`. Refresh tokens deliberately
//! carry no user-identifying claim; identity is bound only through the
//! registry record, so leaked refresh-token bytes alone are useless.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // user id
    #[serde(rename = "type")]
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "type")]
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Raw refresh token plus its expiry, handed to the registry for hashing.
#[derive(Debug)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_access_token(
    user_id: &str,
    secret: &str,
    ttl_minutes: u64,
) -> anyhow::Result<String> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user_id.to_string(),
        token_type: TOKEN_TYPE_ACCESS.to_string(),
        exp: (now + Duration::minutes(ttl_minutes as i64)).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn issue_refresh_token(secret: &str, ttl_days: u64) -> anyhow::Result<IssuedRefreshToken> {
    let now = Utc::now();
    let expires_at = now + Duration::days(ttl_days as i64);
    let claims = RefreshClaims {
        token_type: TOKEN_TYPE_REFRESH.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(IssuedRefreshToken { token, expires_at })
}

/// Rejects bad signatures, wrong token type, and expired tokens.
pub fn verify_access_token(token: &str, secret: &str) -> anyhow::Result<AccessClaims> {
    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    if token_data.claims.token_type != TOKEN_TYPE_ACCESS {
        anyhow::bail!("Not an access token");
    }

    Ok(token_data.claims)
}

pub fn verify_refresh_token(token: &str, secret: &str) -> anyhow::Result<RefreshClaims> {
    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    if token_data.claims.token_type != TOKEN_TYPE_REFRESH {
        anyhow::bail!("Not a refresh token");
    }

    Ok(token_data.claims)
}
