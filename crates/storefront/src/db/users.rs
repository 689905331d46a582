//! User repository for database operations.
//!
//! This module provides database access for users, their password hashes,
//! and password reset tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use model2design_core::{Email, PasswordResetTokenId, Phone, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewUser, PasswordResetToken, ProfileUpdate, User};

const EMAIL_TAKEN: &str = "email already exists";

/// Storage for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// `RepositoryError::Conflict` if the email already exists.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// A user and their password hash, for login.
    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// # Errors
    ///
    /// `RepositoryError::Conflict` if another user has the email.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Returns whether the user exists.
    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError>;

    async fn create_reset_token(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError>;

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError>;

    /// Mark a token used. Returns `false` when it was already used, so only
    /// one of two concurrent resets succeeds.
    async fn mark_reset_token_used(
        &self,
        id: PasswordResetTokenId,
    ) -> Result<bool, RepositoryError>;
}

#[derive(FromRow)]
struct UserRow {
    id: i32,
    full_name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let phone = r
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;
        Ok(Self {
            id: UserId::new(r.id),
            full_name: r.full_name,
            email,
            phone,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(FromRow)]
struct ResetTokenRow {
    id: i32,
    user_id: i32,
    token: String,
    created_at: DateTime<Utc>,
    used: bool,
}

impl From<ResetTokenRow> for PasswordResetToken {
    fn from(r: ResetTokenRow) -> Self {
        Self {
            id: PasswordResetTokenId::new(r.id),
            user_id: UserId::new(r.user_id),
            token: r.token,
            created_at: r.created_at,
            used: r.used,
        }
    }
}

const USER_COLUMNS: &str = "id, full_name, email, phone, created_at, updated_at";

/// `PostgreSQL` user repository.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO storefront."user" (full_name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.full_name)
            .bind(user.email.as_str())
            .bind(user.phone.as_ref().map(Phone::as_str))
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))?;
        row.try_into()
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM storefront."user" WHERE id = $1"#);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM storefront."user" WHERE email = $1"#);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            r#"SELECT {USER_COLUMNS}, password_hash FROM storefront."user" WHERE email = $1"#
        );
        let row = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar(r#"SELECT password_hash FROM storefront."user" WHERE id = $1"#)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        Ok(hash)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE storefront."user"
            SET full_name = $2, email = $3, phone = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i32())
            .bind(&update.full_name)
            .bind(update.email.as_str())
            .bind(update.phone.as_ref().map(Phone::as_str))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, EMAIL_TAKEN))?;
        row.map(User::try_from).transpose()
    }

    async fn set_password(&self, id: UserId, password_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE storefront."user" SET password_hash = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id.as_i32())
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_reset_token(
        &self,
        user: UserId,
        token: &str,
    ) -> Result<PasswordResetToken, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            INSERT INTO storefront.password_reset_token (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at, used
            ",
        )
        .bind(user.as_i32())
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "reset token collision"))?;
        Ok(row.into())
    }

    async fn find_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            SELECT id, user_id, token, created_at, used
            FROM storefront.password_reset_token
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(PasswordResetToken::from))
    }

    async fn mark_reset_token_used(
        &self,
        id: PasswordResetTokenId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.password_reset_token SET used = TRUE WHERE id = $1 AND NOT used",
        )
        .bind(id.as_i32())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
