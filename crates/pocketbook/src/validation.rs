//! Checks run on auth forms before anything is sent to the server.
use thiserror::Error;

use crate::error::StoreError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const CODE_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Name is required")]
    NameRequired,
    #[error("Email is required")]
    EmailRequired,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Please enter a valid 6-digit code")]
    InvalidCode,
}

impl From<FormError> for StoreError {
    fn from(err: FormError) -> Self {
        Self::Validation(err.to_string())
    }
}

fn required(value: &str, err: FormError) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(err);
    }
    Ok(())
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), FormError> {
    required(password, FormError::PasswordRequired)?;
    if password != confirm {
        return Err(FormError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FormError::PasswordTooShort);
    }
    Ok(())
}

pub fn check_login(email: &str, password: &str) -> Result<(), FormError> {
    required(email, FormError::EmailRequired)?;
    required(password, FormError::PasswordRequired)
}

pub fn check_register(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), FormError> {
    required(name, FormError::NameRequired)?;
    required(email, FormError::EmailRequired)?;
    check_new_password(password, confirm)
}

pub fn check_change_password(email: &str, password: &str, confirm: &str) -> Result<(), FormError> {
    required(email, FormError::EmailRequired)?;
    check_new_password(password, confirm)
}

/// Exactly six ASCII digits; leading zeros are kept in the count.
pub fn parse_code(input: &str) -> Result<u32, FormError> {
    let code = input.trim();
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormError::InvalidCode);
    }
    code.parse().map_err(|_| FormError::InvalidCode)
}
