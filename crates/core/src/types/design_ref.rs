//! Opaque references from cart lines to designs.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::DesignId;

/// Prefix carried by references to designs that only exist client-side for a
/// guest, and by guest cart line ids.
pub const GUEST_PREFIX: &str = "guest_";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DesignRefError {
    #[error("design reference cannot be empty")]
    Empty,
    #[error("design reference must be at most {max} characters")]
    TooLong { max: usize },
    #[error("design reference cannot contain whitespace")]
    Whitespace,
}

/// The design a cart line points at.
///
/// Either the numeric id of a saved design (`"42"`) or a client-generated
/// guest reference (`"guest_1699999999"`). The cart never dereferences it; it
/// is only the uniqueness key of a line within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DesignRef(String);

impl DesignRef {
    pub const MAX_LENGTH: usize = 100;

    /// Parse a reference.
    ///
    /// # Errors
    ///
    /// Rejects empty, over-long, and whitespace-containing input.
    pub fn parse(s: &str) -> Result<Self, DesignRefError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DesignRefError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(DesignRefError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(DesignRefError::Whitespace);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The saved design id, when the reference is numeric.
    #[must_use]
    pub fn saved_design(&self) -> Option<DesignId> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Whether this references an unsaved guest design.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }
}

impl fmt::Display for DesignRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DesignId> for DesignRef {
    fn from(id: DesignId) -> Self {
        Self(id.to_string())
    }
}

impl TryFrom<String> for DesignRef {
    type Error = DesignRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DesignRef> for String {
    fn from(value: DesignRef) -> Self {
        value.0
    }
}
