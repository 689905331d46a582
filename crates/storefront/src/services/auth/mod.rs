//! Authentication service.
//!
//! Password accounts: registration, login, profile and password changes, and
//! the forgot/reset flow with single-use tokens.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

use model2design_core::{Email, Phone, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::user::RESET_TOKEN_LENGTH;
use crate::models::{NewUser, PasswordResetToken, ProfileUpdate, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form fields.
#[derive(Debug, Clone, Default)]
pub struct Registration<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::InvalidPhone` for malformed contact details.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: &Registration<'_>) -> Result<User, AuthError> {
        let full_name = required(form.full_name, "full name")?;
        let email = Email::parse(form.email)?;
        let phone = Phone::parse(form.phone)?;
        validate_new_password(form.password, form.password_confirm)?;

        let password_hash = hash_password(form.password)?;

        let user = self
            .users
            .create(&NewUser {
                full_name: full_name.to_owned(),
                email,
                phone: Some(phone),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        required(email, "email address")?;
        required(password, "password")?;
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change name, email, and phone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailInUse` if another account has the email.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        full_name: &str,
        email: &str,
        phone: &str,
    ) -> Result<User, AuthError> {
        let update = ProfileUpdate {
            full_name: required(full_name, "full name")?.to_owned(),
            email: Email::parse(email)?,
            phone: Some(Phone::parse(phone)?),
        };

        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailInUse,
                other => AuthError::Repository(other),
            })?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change the password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `current` is wrong.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        let hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(current, &hash).map_err(|_| AuthError::IncorrectPassword)?;
        validate_new_password(new_password, confirm)?;

        let new_hash = hash_password(new_password)?;
        if !self.users.set_password(user_id, &new_hash).await? {
            return Err(AuthError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Start a password reset.
    ///
    /// Returns the user and a fresh token when the email belongs to an account,
    /// `None` otherwise. Callers report success either way.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, PasswordResetToken)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = self
            .users
            .create_reset_token(user.id, &generate_reset_token())
            .await?;
        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(Some((user, token)))
    }

    /// Whether a reset token can still be used.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if it is unknown, used, or expired.
    pub async fn check_reset_token(&self, token: &str) -> Result<PasswordResetToken, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidResetToken);
        }
        self.users
            .find_reset_token(token)
            .await?
            .filter(|t| t.is_valid(Utc::now()))
            .ok_or(AuthError::InvalidResetToken)
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token cannot be used.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        let reset = self.check_reset_token(token).await?;
        validate_new_password(password, confirm)?;
        let new_hash = hash_password(password)?;

        if !self.users.mark_reset_token_used(reset.id).await? {
            return Err(AuthError::InvalidResetToken);
        }
        if !self.users.set_password(reset.user_id, &new_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(user_id = %reset.user_id, "Password reset completed");
        Ok(())
    }
}

fn required<'s>(value: &'s str, field: &'static str) -> Result<&'s str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    Ok(())
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    validate_password(password)?;
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// 64 random alphanumeric characters.
fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Whether a post-login redirect target stays on this site.
#[must_use]
pub fn is_safe_redirect(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}
