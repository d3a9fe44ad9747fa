//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AuthError, AuthResult};

/// Validate username
pub fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::invalid("username", "Username is required"));
    }

    if username.len() < 3 {
        return Err(AuthError::invalid(
            "username",
            "Username must be at least 3 characters long",
        ));
    }

    if username.len() > 32 {
        return Err(AuthError::invalid(
            "username",
            "Username must be at most 32 characters long",
        ));
    }

    static USERNAME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_.]+$").ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(username));

    if !valid {
        return Err(AuthError::invalid(
            "username",
            "Username can only contain letters, numbers, dots and underscores",
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(AuthError::invalid("email", "Email is required"));
    }

    if email.len() > 254 {
        return Err(AuthError::invalid(
            "email",
            "Email must be at most 254 characters long",
        ));
    }

    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(email));

    if !valid {
        return Err(AuthError::invalid("email", "Invalid email format"));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::invalid(
            "password",
            "Password must be at least 8 characters long",
        ));
    }

    if password.len() > 128 {
        return Err(AuthError::invalid(
            "password",
            "Password must be at most 128 characters long",
        ));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(AuthError::invalid(
            "password",
            "Password must contain at least one letter",
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::invalid(
            "password",
            "Password must contain at least one digit",
        ));
    }

    Ok(())
}
