//! Session service: orchestrates the credential store, token issuer, and
//! refresh-token registry behind the HTTP handlers.

use chrono::Utc;
use validator::Validate;

use crate::{
    config::Config,
    db::connection::DbPool,
    error::AppError,
    models::user::{
        AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, ResetPasswordRequest,
        SignupRequest, TokenPairResponse, User, UserResponse,
    },
    repositories::users,
    services::registry,
    utils::hashing,
};

pub async fn signup(
    pool: &DbPool,
    config: &Config,
    payload: SignupRequest,
) -> Result<AuthResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    if users::find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hashing::hash_secret(&payload.password)?;
    let user = users::create(pool, &email, payload.full_name.trim(), &password_hash).await?;

    tracing::info!(user_id = %user.id, "New account created");

    let pair = registry::issue_session(pool, config, &user.id).await?;
    Ok(AuthResponse {
        user: user.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

pub async fn login(
    pool: &DbPool,
    config: &Config,
    payload: LoginRequest,
) -> Result<AuthResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    // Same error for an unknown email and a wrong password; the response
    // must not reveal whether the account exists.
    let user = users::find_by_email(pool, &email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !hashing::verify_secret(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let pair = registry::issue_session(pool, config, &user.id).await?;
    Ok(AuthResponse {
        user: user.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

pub async fn refresh(
    pool: &DbPool,
    config: &Config,
    raw_refresh_token: &str,
) -> Result<TokenPairResponse, AppError> {
    let (_user_id, pair) = registry::rotate(pool, config, raw_refresh_token).await?;
    Ok(TokenPairResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

/// Idempotent: an unknown, expired, or already-rotated token is a no-op.
pub async fn logout(
    pool: &DbPool,
    config: &Config,
    raw_refresh_token: Option<&str>,
) -> Result<MessageResponse, AppError> {
    if let Some(raw) = raw_refresh_token {
        registry::revoke_presented(pool, config, raw).await?;
    }

    Ok(MessageResponse {
        message: "Logged out".to_string(),
    })
}

pub async fn logout_all_devices(pool: &DbPool, user: &User) -> Result<MessageResponse, AppError> {
    let revoked = registry::revoke_all_for_user(pool, &user.id).await?;
    tracing::info!(user_id = %user.id, revoked, "Logged out of all devices");

    Ok(MessageResponse {
        message: "Logged out of all devices".to_string(),
    })
}

/// Changes the caller's password. Existing refresh tokens stay valid; other
/// devices keep their sessions until they expire or are revoked explicitly.
pub async fn update_password(
    pool: &DbPool,
    user: &User,
    payload: ChangePasswordRequest,
) -> Result<MessageResponse, AppError> {
    payload.validate()?;

    if !hashing::verify_secret(&payload.current_password, &user.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hashing::hash_secret(&payload.new_password)?;
    users::update_password_hash(pool, &user.id, &new_hash, Utc::now()).await?;

    Ok(MessageResponse {
        message: "Password updated successfully".to_string(),
    })
}

/// Always reports success; the response must not reveal whether the account
/// exists. Out-of-band delivery is an external collaborator, stubbed here.
pub async fn reset_password(
    pool: &DbPool,
    payload: ResetPasswordRequest,
) -> Result<MessageResponse, AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    if let Some(user) = users::find_by_email(pool, &email).await? {
        tracing::info!(user_id = %user.id, "Password reset requested");
    }

    Ok(MessageResponse {
        message: "Password reset instructions sent to your email".to_string(),
    })
}

pub fn profile(user: &User) -> UserResponse {
    user.clone().into()
}
