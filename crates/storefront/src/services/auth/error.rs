//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during account operations.
///
/// Display strings are shown to the customer as-is, except for
/// `Repository` and `PasswordHash` which are reported as internal errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] model2design_core::EmailError),

    /// Phone number does not have ten digits.
    #[error("Please enter a valid 10-digit phone number")]
    InvalidPhone(#[from] model2design_core::PhoneError),

    /// A required field was empty.
    #[error("Please enter your {0}")]
    MissingField(&'static str),

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Registration with an email that already has an account.
    #[error("This email is already registered")]
    UserAlreadyExists,

    /// Profile change to an email owned by another account.
    #[error("This email is already in use by another account")]
    EmailInUse,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Current password check failed during a password change.
    #[error("Current password is incorrect")]
    IncorrectPassword,

    /// Reset token is unknown, used, or expired.
    #[error("Invalid or expired reset link.")]
    InvalidResetToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
