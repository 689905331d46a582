//! Who owns a design, an uploaded image, or a cart.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Stable identifier of an anonymous visitor.
///
/// Minted on first use and kept in the visitor's session. It survives the
/// session id rotation performed at login, which is what lets guest data be
/// found again and handed to the new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Mint a new random guest id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Exclusive owner of a stored record: a registered user or a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    User(UserId),
    Guest(GuestId),
}

impl Owner {
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    #[must_use]
    pub const fn guest_id(&self) -> Option<GuestId> {
        match self {
            Self::User(_) => None,
            Self::Guest(id) => Some(*id),
        }
    }

    /// Rebuild an owner from the pair of nullable columns it is stored in.
    ///
    /// Returns `None` unless exactly one column is set.
    #[must_use]
    pub fn from_columns(user_id: Option<i32>, guest_id: Option<Uuid>) -> Option<Self> {
        match (user_id, guest_id) {
            (Some(user), None) => Some(Self::User(UserId::new(user))),
            (None, Some(guest)) => Some(Self::Guest(GuestId::from_uuid(guest))),
            _ => None,
        }
    }

    /// Split into the `(user_id, guest_id)` column pair.
    #[must_use]
    pub fn to_columns(&self) -> (Option<i32>, Option<Uuid>) {
        match self {
            Self::User(id) => (Some(id.as_i32()), None),
            Self::Guest(id) => (None, Some(id.as_uuid())),
        }
    }
}

impl From<UserId> for Owner {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<GuestId> for Owner {
    fn from(id: GuestId) -> Self {
        Self::Guest(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_round_trip_requires_exactly_one() {
        let guest = GuestId::generate();
        let (u, g) = Owner::Guest(guest).to_columns();
        assert_eq!(Owner::from_columns(u, g), Some(Owner::Guest(guest)));

        assert_eq!(Owner::from_columns(Some(4), None), Some(Owner::User(UserId::new(4))));
        assert_eq!(Owner::from_columns(None, None), None);
        assert_eq!(Owner::from_columns(Some(4), Some(guest.as_uuid())), None);
    }
}
