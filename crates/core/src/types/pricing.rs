//! Quantity-tiered unit pricing.
//!
//! A product carries a map of `minimum quantity -> unit price`. An order of
//! `n` units is charged at the tier with the largest threshold that does not
//! exceed `n`. Brands may override the map for their storefront.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unit price used when neither the brand nor the product yields a tier.
pub const FALLBACK_UNIT_PRICE: Decimal = Decimal::from_parts(1999, 0, 0, false, 2);

/// Flat shipping charge added to every cart total.
pub const SHIPPING_FLAT_RATE: Decimal = Decimal::from_parts(1500, 0, 0, false, 2);

/// Errors raised when building a tier table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceTiersError {
    #[error("price tier thresholds start at 1")]
    ZeroThreshold,
    #[error("price for tier {0} is negative")]
    NegativePrice(u32),
}

/// A table of quantity thresholds and their unit prices.
///
/// Serialized as a JSON object keyed by the threshold, e.g.
/// `{"1": "100", "5": "80", "10": "60"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, Decimal>", into = "BTreeMap<u32, Decimal>")]
pub struct PriceTiers(BTreeMap<u32, Decimal>);

impl PriceTiers {
    /// Build a tier table.
    ///
    /// # Errors
    ///
    /// Rejects a `0` threshold and negative prices.
    pub fn new(tiers: BTreeMap<u32, Decimal>) -> Result<Self, PriceTiersError> {
        for (&threshold, price) in &tiers {
            if threshold == 0 {
                return Err(PriceTiersError::ZeroThreshold);
            }
            if price.is_sign_negative() {
                return Err(PriceTiersError::NegativePrice(threshold));
            }
        }
        Ok(Self(tiers))
    }

    /// Build a tier table from `(threshold, price)` pairs.
    ///
    /// # Errors
    ///
    /// Same rules as [`PriceTiers::new`].
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u32, Decimal)>) -> Result<Self, PriceTiersError> {
        Self::new(pairs.into_iter().collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Decimal)> + '_ {
        self.0.iter().map(|(&k, &v)| (k, v))
    }

    /// The tier with the largest threshold `<= quantity`, if any.
    #[must_use]
    pub fn qualifying_tier(&self, quantity: i64) -> Option<Decimal> {
        let quantity = u32::try_from(quantity).ok()?;
        self.0.range(..=quantity).next_back().map(|(_, &price)| price)
    }

    /// Unit price for `quantity` units.
    ///
    /// Uses the qualifying tier, then the single-unit tier. Returns `None`
    /// when neither exists so the caller can pick its own fallback.
    #[must_use]
    pub fn price_for(&self, quantity: i64) -> Option<Decimal> {
        self.qualifying_tier(quantity)
            .or_else(|| self.0.get(&1).copied())
    }

    /// The advertised "from" price of a product.
    ///
    /// The single-unit tier when present, otherwise the cheapest tier,
    /// otherwise [`FALLBACK_UNIT_PRICE`].
    #[must_use]
    pub fn base_price(&self) -> Decimal {
        self.0
            .get(&1)
            .copied()
            .or_else(|| self.0.values().min().copied())
            .unwrap_or(FALLBACK_UNIT_PRICE)
    }
}

impl TryFrom<BTreeMap<u32, Decimal>> for PriceTiers {
    type Error = PriceTiersError;

    fn try_from(value: BTreeMap<u32, Decimal>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriceTiers> for BTreeMap<u32, Decimal> {
    fn from(tiers: PriceTiers) -> Self {
        tiers.0
    }
}

/// Resolve the unit price a brand charges for `quantity` units of a product.
///
/// A brand override is consulted first but only wins when one of its tiers
/// qualifies. Otherwise the product's own table applies, and a product with
/// no usable tier is charged [`FALLBACK_UNIT_PRICE`].
#[must_use]
pub fn unit_price(product: &PriceTiers, brand_override: Option<&PriceTiers>, quantity: i64) -> Decimal {
    brand_override
        .and_then(|tiers| tiers.qualifying_tier(quantity))
        .or_else(|| product.price_for(quantity))
        .unwrap_or(FALLBACK_UNIT_PRICE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tiers(pairs: &[(u32, i64)]) -> PriceTiers {
        PriceTiers::from_pairs(pairs.iter().map(|&(q, p)| (q, Decimal::from(p)))).unwrap()
    }

    #[test]
    fn test_largest_threshold_not_exceeding_quantity() {
        let t = tiers(&[(1, 100), (5, 80), (10, 60)]);
        assert_eq!(t.price_for(7), Some(Decimal::from(80)));
        assert_eq!(t.price_for(5), Some(Decimal::from(80)));
        assert_eq!(t.price_for(10), Some(Decimal::from(60)));
        assert_eq!(t.price_for(250), Some(Decimal::from(60)));
    }

    #[test]
    fn test_zero_and_negative_quantities_use_single_unit_tier() {
        let t = tiers(&[(1, 100), (5, 80), (10, 60)]);
        assert_eq!(t.price_for(0), Some(Decimal::from(100)));
        assert_eq!(t.price_for(-4), Some(Decimal::from(100)));
    }

    #[test]
    fn test_no_qualifying_tier_and_no_single_unit_tier() {
        let t = tiers(&[(5, 80)]);
        assert_eq!(t.price_for(2), None);
        assert_eq!(unit_price(&t, None, 2), FALLBACK_UNIT_PRICE);
        assert_eq!(unit_price(&PriceTiers::default(), None, 3), FALLBACK_UNIT_PRICE);
    }

    #[test]
    fn test_brand_override_wins_only_when_it_qualifies() {
        let product = tiers(&[(1, 100), (5, 80)]);
        let brand = tiers(&[(3, 70)]);
        assert_eq!(unit_price(&product, Some(&brand), 4), Decimal::from(70));
        assert_eq!(unit_price(&product, Some(&brand), 6), Decimal::from(70));
        assert_eq!(unit_price(&product, Some(&brand), 2), Decimal::from(100));
        assert_eq!(unit_price(&product, Some(&PriceTiers::default()), 6), Decimal::from(80));
    }

    #[test]
    fn test_base_price() {
        assert_eq!(tiers(&[(1, 90), (3, 80)]).base_price(), Decimal::from(90));
        assert_eq!(tiers(&[(3, 80), (10, 55)]).base_price(), Decimal::from(55));
        assert_eq!(PriceTiers::default().base_price(), FALLBACK_UNIT_PRICE);
    }

    #[test]
    fn test_constants() {
        assert_eq!(FALLBACK_UNIT_PRICE.to_string(), "19.99");
        assert_eq!(SHIPPING_FLAT_RATE.to_string(), "15.00");
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            PriceTiers::from_pairs([(0, Decimal::ONE)]),
            Err(PriceTiersError::ZeroThreshold)
        );
        assert_eq!(
            PriceTiers::from_pairs([(2, Decimal::NEGATIVE_ONE)]),
            Err(PriceTiersError::NegativePrice(2))
        );
    }

    #[test]
    fn test_json_shape_accepts_numbers() {
        let t: PriceTiers = serde_json::from_str(r#"{"1": 100, "5": "80.50"}"#).unwrap();
        assert_eq!(t.price_for(6), Some(Decimal::new(8050, 2)));
        assert!(serde_json::from_str::<PriceTiers>(r#"{"0": 1}"#).is_err());
    }
}
