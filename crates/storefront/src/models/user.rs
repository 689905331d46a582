//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use model2design_core::{Email, PasswordResetTokenId, Phone, UserId};

/// How long a password reset link stays usable.
pub const RESET_TOKEN_LIFETIME: Duration = Duration::hours(1);

/// Length of a password reset token.
pub const RESET_TOKEN_LENGTH: usize = 64;

/// A registered customer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// How long the user has been a member, e.g. `3 days`, `1 month`, `2 years`.
    #[must_use]
    pub fn member_duration(&self, now: DateTime<Utc>) -> String {
        member_duration(now.signed_duration_since(self.created_at).num_days())
    }
}

/// Humanize a membership length given in whole days.
///
/// Over a year counts years, over a month counts months (30 days).
#[must_use]
pub fn member_duration(days: i64) -> String {
    let days = days.max(0);
    let (amount, unit) = if days > 365 {
        (days / 365, "year")
    } else if days > 30 {
        (days / 30, "month")
    } else {
        (days, "day")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
    pub password_hash: String,
}

/// Profile fields a user may change.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: Email,
    pub phone: Option<Phone>,
}

/// A single-use password reset token.
#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: PasswordResetTokenId,
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub used: bool,
}

impl PasswordResetToken {
    /// Unused and younger than [`RESET_TOKEN_LIFETIME`].
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.used && now.signed_duration_since(self.created_at) < RESET_TOKEN_LIFETIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_duration_units() {
        assert_eq!(member_duration(0), "0 days");
        assert_eq!(member_duration(1), "1 day");
        assert_eq!(member_duration(30), "30 days");
        assert_eq!(member_duration(31), "1 month");
        assert_eq!(member_duration(65), "2 months");
        assert_eq!(member_duration(365), "12 months");
        assert_eq!(member_duration(366), "1 year");
        assert_eq!(member_duration(800), "2 years");
    }

    #[test]
    fn test_reset_token_expiry() {
        let now = Utc::now();
        let mut token = PasswordResetToken {
            id: PasswordResetTokenId::new(1),
            user_id: UserId::new(1),
            token: "a".repeat(RESET_TOKEN_LENGTH),
            created_at: now - Duration::minutes(59),
            used: false,
        };
        assert!(token.is_valid(now));

        token.created_at = now - Duration::minutes(61);
        assert!(!token.is_valid(now));

        token.created_at = now;
        token.used = true;
        assert!(!token.is_valid(now));
    }
}
