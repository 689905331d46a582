//! Newtype ids for the storefront's tables.
//!
//! Every table keyed by a `SERIAL` column gets its own wrapper so a `DesignId`
//! can never be passed where a `CartItemId` is expected.

/// Define an integer id wrapper.
///
/// The generated type wraps an `i32` and provides:
/// - serde support as a bare number (`#[serde(transparent)]`)
/// - `new()`, `as_i32()`, `Display`, `FromStr`, and conversions to/from `i32`
/// - sqlx `Type`, `Encode`, and `Decode` for Postgres (with the `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use model2design_core::define_id;
/// define_id!(BrandId);
/// define_id!(DesignId);
///
/// let brand: BrandId = "7".parse().unwrap();
/// assert_eq!(brand.as_i32(), 7);
///
/// // Distinct types, so this won't compile:
/// // let _: DesignId = brand;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database id.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database id.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(BrandId);
define_id!(ProductId);
define_id!(UserId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(DesignId);
define_id!(DesignImageId);
define_id!(PasswordResetTokenId);
define_id!(SupportSubmissionId);
define_id!(FaqId);
define_id!(TutorialId);
define_id!(DesignTemplateId);
define_id!(BrandImageId);
define_id!(BrandImageCategoryId);
define_id!(BrandTemplateId);
