//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates password format.
///
/// Requirements:
/// - At least 6 characters
/// - Not entirely whitespace
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 6 {
        return Err(ValidationError::new("password_too_short")
            .with_message("Password must be at least 6 characters".into()));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::new("password_blank")
            .with_message("Password must not be blank".into()));
    }

    Ok(())
}

/// Validates a user's full name.
///
/// Requirements:
/// - At least 2 characters after trimming
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().chars().count() < 2 {
        return Err(ValidationError::new("full_name_too_short")
            .with_message("Full name must be at least 2 characters".into()));
    }

    Ok(())
}
