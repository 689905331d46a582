//! Support request categories and their fixed choice lists.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// One entry of a select list: stored value and display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

const fn choice(value: &'static str, label: &'static str) -> Choice {
    Choice { value, label }
}

pub const ORDER_ISSUES: &[Choice] = &[
    choice("tracking", "Order Tracking"),
    choice("damaged", "Damaged Product"),
    choice("wrong", "Wrong Item Received"),
    choice("missing", "Missing Items"),
    choice("return", "Return Request"),
    choice("other", "Other"),
];

pub const ACCOUNT_ISSUES: &[Choice] = &[
    choice("login", "Can't Log In"),
    choice("password", "Password Reset"),
    choice("email", "Email Change"),
    choice("delete", "Delete Account"),
    choice("other", "Other"),
];

pub const DESIGN_ISSUES: &[Choice] = &[
    choice("upload", "Can't Upload Images"),
    choice("save", "Can't Save Design"),
    choice("editor", "Editor Not Loading"),
    choice("quality", "Design Quality Issue"),
    choice("custom_model", "Request Custom Model"),
    choice("features", "Feature Request"),
    choice("other", "Other"),
];

pub const MODEL_TYPES: &[Choice] = &[
    choice("apparel", "Apparel (T-shirt, Hoodie, etc.)"),
    choice("drinkware", "Drinkware (Mug, Tumbler, etc.)"),
    choice("accessories", "Accessories (Hat, Bag, etc.)"),
    choice("home_decor", "Home Decor"),
    choice("office", "Office Supplies"),
    choice("electronics", "Electronics Accessories"),
    choice("other", "Other"),
];

/// The first entry is the default.
pub const MODEL_PRIORITIES: &[Choice] = &[
    choice("normal", "Normal"),
    choice("high", "High - Need ASAP"),
    choice("low", "Low - When convenient"),
];

/// The first entry is the default.
pub const INTENDED_USES: &[Choice] = &[
    choice("personal", "Personal Project"),
    choice("business", "Business/Commercial"),
    choice("testing", "Testing/Prototype"),
];

/// Whether `value` is one of `choices`.
#[must_use]
pub fn is_valid_choice(choices: &[Choice], value: &str) -> bool {
    choices.iter().any(|c| c.value == value)
}

/// Returned when a path segment names no support category.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown support category: {0}")]
pub struct UnknownCategory(pub String);

/// The support form a submission came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.support_category", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SupportCategory {
    Orders,
    Account,
    Designing,
    RequestModel,
    Website,
    #[default]
    General,
}

impl SupportCategory {
    pub const ALL: [Self; 6] = [
        Self::Orders,
        Self::Account,
        Self::Designing,
        Self::RequestModel,
        Self::Website,
        Self::General,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Account => "account",
            Self::Designing => "designing",
            Self::RequestModel => "request_model",
            Self::Website => "website",
            Self::General => "general",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Orders => "Orders",
            Self::Account => "Account",
            Self::Designing => "Designing",
            Self::RequestModel => "Request Model",
            Self::Website => "Website Problem",
            Self::General => "General",
        }
    }

    /// Allowed `issue_type` values, for the categories that ask for one.
    #[must_use]
    pub const fn issue_types(&self) -> Option<&'static [Choice]> {
        match self {
            Self::Orders => Some(ORDER_ISSUES),
            Self::Account => Some(ACCOUNT_ISSUES),
            Self::Designing => Some(DESIGN_ISSUES),
            Self::RequestModel | Self::Website | Self::General => None,
        }
    }

    /// Parse a category, treating anything unrecognised as general.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for SupportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}
