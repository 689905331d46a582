//! Ten-digit phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a phone number does not reduce to ten digits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Please enter a valid 10-digit phone number")]
pub struct PhoneError;

/// A phone number stored as exactly ten digits.
///
/// Formatting characters are discarded on parse, so `(555) 010-0199` and
/// `555.010.0199` both become `5550100199`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Number of digits a phone number must contain.
    pub const DIGITS: usize = 10;

    /// Parse a phone number, keeping only its digits.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] unless exactly ten digits remain.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == Self::DIGITS {
            Ok(Self(digits))
        } else {
            Err(PhoneError)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}
