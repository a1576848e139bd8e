//! Credential store: persistence for user accounts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{db::connection::DbPool, error::AppError, models::user::User};

pub async fn create(
    pool: &DbPool,
    email: &str,
    full_name: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        full_name: full_name.to_string(),
        password_hash: password_hash.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let result = sqlx::query(
        "INSERT INTO users (id, email, full_name, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(err) => {
            let unique_violation = err
                .as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation());
            if unique_violation {
                Err(AppError::DuplicateEmail)
            } else {
                Err(err.into())
            }
        }
    }
}

pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, full_name, password_hash, created_at, updated_at \
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &DbPool, user_id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, full_name, password_hash, created_at, updated_at \
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn update_password_hash(
    pool: &DbPool,
    user_id: &str,
    new_hash: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(new_hash)
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User"));
    }

    Ok(())
}
