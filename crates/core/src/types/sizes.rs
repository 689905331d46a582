//! Per-size quantity breakdown of a cart line.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How many units of each size a cart line holds, e.g. `{"S": 2, "M": 1}`.
///
/// Never contains a zero entry: constructors and updates drop sizes whose
/// quantity falls to zero or below, so [`SizeQuantities::total`] always equals
/// the line's quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeQuantities(BTreeMap<String, u32>);

impl SizeQuantities {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A breakdown holding one size.
    #[must_use]
    pub fn single(size: impl Into<String>, quantity: u32) -> Self {
        let mut sizes = Self::new();
        sizes.add(size, quantity);
        sizes
    }

    /// Build from caller-supplied quantities, dropping entries `<= 0`.
    #[must_use]
    pub fn from_signed<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        let inner = entries
            .into_iter()
            .filter(|(_, qty)| *qty > 0)
            .map(|(size, qty)| (size.into(), u32::try_from(qty).unwrap_or(u32::MAX)))
            .collect();
        Self(inner)
    }

    /// Add `quantity` units of `size` to whatever is already there.
    pub fn add(&mut self, size: impl Into<String>, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.0.entry(size.into()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Sum another breakdown into this one, size by size.
    pub fn merge(&mut self, other: &Self) {
        for (size, &quantity) in &other.0 {
            self.add(size.clone(), quantity);
        }
    }

    /// Total units across all sizes.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.values().fold(0_u32, |acc, q| acc.saturating_add(*q))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, size: &str) -> Option<u32> {
        self.0.get(size).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(size, &qty)| (size.as_str(), qty))
    }

    /// Human readable breakdown such as `2x S, 1x M`.
    ///
    /// Sizes follow their position in `size_order` (the product's size
    /// list); sizes missing from it come last in alphabetical order.
    #[must_use]
    pub fn display(&self, size_order: &[String]) -> String {
        let mut entries: Vec<(usize, &str, u32)> = self
            .iter()
            .map(|(size, qty)| {
                let rank = size_order
                    .iter()
                    .position(|s| s == size)
                    .unwrap_or(usize::MAX);
                (rank, size, qty)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        entries
            .into_iter()
            .map(|(_, size, qty)| format!("{qty}x {size}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accumulates_per_size() {
        let mut sizes = SizeQuantities::single("S", 2);
        sizes.add("S", 1);
        sizes.add("M", 4);
        assert_eq!(sizes.get("S"), Some(3));
        assert_eq!(sizes.total(), 7);
    }

    #[test]
    fn test_from_signed_drops_non_positive() {
        let sizes = SizeQuantities::from_signed([("S", 2), ("M", 0), ("L", -3)]);
        assert_eq!(sizes.total(), 2);
        assert_eq!(sizes.get("M"), None);
        assert!(SizeQuantities::from_signed([("S", 0)]).is_empty());
    }

    #[test]
    fn test_merge_sums() {
        let mut user = SizeQuantities::single("S", 1);
        user.merge(&SizeQuantities::from_signed([("S", 2), ("XL", 1)]));
        assert_eq!(user.get("S"), Some(3));
        assert_eq!(user.get("XL"), Some(1));
        assert_eq!(user.total(), 4);
    }

    #[test]
    fn test_display_follows_product_size_order() {
        let sizes = SizeQuantities::from_signed([("Small", 2), ("Medium", 1), ("Custom", 1)]);
        let order = vec!["Small".to_string(), "Medium".to_string(), "Large".to_string()];
        assert_eq!(sizes.display(&order), "2x Small, 1x Medium, 1x Custom");
    }
}
