//! Cart domain types.
//!
//! Signed-in users keep their cart in the database as [`CartItem`] rows.
//! Guests keep a [`GuestCart`] in their session. Both render to the same
//! [`CartView`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use model2design_core::{
    CartId, CartItemId, DesignRef, GUEST_PREFIX, ProductId, SHIPPING_FLAT_RATE, SizeQuantities,
};

/// A line in a user's database cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub design_ref: DesignRef,
    pub design_name: String,
    pub thumbnail: Option<String>,
    pub product_id: ProductId,
    pub sizes: SizeQuantities,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.sizes.total()
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity())
    }
}

/// Fields for inserting a cart line.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub design_ref: DesignRef,
    pub design_name: String,
    pub thumbnail: Option<String>,
    pub product_id: ProductId,
    pub sizes: SizeQuantities,
    pub unit_price: Decimal,
}

/// A line in a guest's session cart.
///
/// The unit price is not stored; it is recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCartLine {
    pub design_ref: DesignRef,
    pub design_name: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub product_id: ProductId,
    pub sizes: SizeQuantities,
    pub added_at: DateTime<Utc>,
}

impl GuestCartLine {
    /// Item id exposed to clients, `guest_{design_ref}`.
    #[must_use]
    pub fn item_id(&self) -> String {
        format!("{GUEST_PREFIX}{}", self.design_ref)
    }
}

/// The session-stored cart of a guest, at most one line per design.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestCart(Vec<GuestCartLine>);

impl GuestCart {
    #[must_use]
    pub fn lines(&self) -> &[GuestCartLine] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn find(&self, design_ref: &DesignRef) -> Option<&GuestCartLine> {
        self.0.iter().find(|line| &line.design_ref == design_ref)
    }

    /// Add a line, or fold its sizes into the existing line for the design.
    pub fn add(&mut self, line: GuestCartLine) {
        if let Some(existing) = self
            .0
            .iter_mut()
            .find(|existing| existing.design_ref == line.design_ref)
        {
            existing.sizes.merge(&line.sizes);
            existing.design_name = line.design_name;
            if line.thumbnail.is_some() {
                existing.thumbnail = line.thumbnail;
            }
        } else {
            self.0.push(line);
        }
    }

    /// Replace a line's sizes. An empty breakdown removes the line.
    ///
    /// Returns `false` when no line matches.
    pub fn update_sizes(&mut self, design_ref: &DesignRef, sizes: SizeQuantities) -> bool {
        let Some(position) = self.0.iter().position(|l| &l.design_ref == design_ref) else {
            return false;
        };
        if sizes.is_empty() {
            self.0.remove(position);
        } else if let Some(line) = self.0.get_mut(position) {
            line.sizes = sizes;
        }
        true
    }

    /// Returns `false` when no line matches.
    pub fn remove(&mut self, design_ref: &DesignRef) -> bool {
        let before = self.0.len();
        self.0.retain(|line| &line.design_ref != design_ref);
        self.0.len() != before
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.0
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.sizes.total()))
    }

    /// Take every line, leaving the cart empty.
    pub fn drain(&mut self) -> Vec<GuestCartLine> {
        std::mem::take(&mut self.0)
    }
}

/// One rendered cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    /// Numeric for user carts, `guest_{design}` for guest carts.
    pub id: String,
    pub design_id: DesignRef,
    pub design_name: String,
    pub thumbnail: Option<String>,
    pub product_id: ProductId,
    pub product_name: String,
    pub sizes: SizeQuantities,
    pub sizes_display: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// A priced cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub count: u32,
}

impl CartView {
    /// Total the lines and add the flat shipping charge.
    #[must_use]
    pub fn from_lines(items: Vec<CartLineView>) -> Self {
        let subtotal = items.iter().map(|line| line.line_total).sum::<Decimal>();
        let count = items
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity));
        Self {
            items,
            subtotal,
            shipping: SHIPPING_FLAT_RATE,
            total: subtotal + SHIPPING_FLAT_RATE,
            count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(design: &str, size: &str, qty: u32) -> GuestCartLine {
        GuestCartLine {
            design_ref: DesignRef::parse(design).unwrap(),
            design_name: format!("Design {design}"),
            thumbnail: None,
            product_id: ProductId::new(1),
            sizes: SizeQuantities::single(size, qty),
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_guest_add_accumulates_per_size() {
        let mut cart = GuestCart::default();
        cart.add(line("12", "S", 2));
        cart.add(line("12", "S", 1));
        cart.add(line("12", "M", 4));
        cart.add(line("guest_abc", "L", 1));

        assert_eq!(cart.lines().len(), 2);
        let first = cart.find(&DesignRef::parse("12").unwrap()).unwrap();
        assert_eq!(first.sizes.get("S"), Some(3));
        assert_eq!(first.sizes.get("M"), Some(4));
        assert_eq!(cart.total_quantity(), 8);
        assert_eq!(first.item_id(), "guest_12");
    }

    #[test]
    fn test_guest_update_to_empty_removes_line() {
        let mut cart = GuestCart::default();
        cart.add(line("12", "S", 2));
        let design = DesignRef::parse("12").unwrap();

        assert!(cart.update_sizes(&design, SizeQuantities::from_signed([("S", 5_i64)])));
        assert_eq!(cart.total_quantity(), 5);

        assert!(cart.update_sizes(&design, SizeQuantities::from_signed([("S", 0_i64)])));
        assert!(cart.is_empty());
        assert!(!cart.update_sizes(&design, SizeQuantities::single("S", 1)));
        assert!(!cart.remove(&design));
    }

    #[test]
    fn test_view_totals_include_shipping() {
        let lines = vec![CartLineView {
            id: "1".to_string(),
            design_id: DesignRef::parse("1").unwrap(),
            design_name: "Team Hoodie".to_string(),
            thumbnail: None,
            product_id: ProductId::new(1),
            product_name: "Hoodie".to_string(),
            sizes: SizeQuantities::single("S", 3),
            sizes_display: "3x S".to_string(),
            quantity: 3,
            unit_price: Decimal::from(90),
            line_total: Decimal::from(270),
        }];
        let view = CartView::from_lines(lines);
        assert_eq!(view.subtotal, Decimal::from(270));
        assert_eq!(view.total, Decimal::from(285));
        assert_eq!(view.count, 3);

        let empty = CartView::from_lines(Vec::new());
        assert_eq!(empty.total, SHIPPING_FLAT_RATE);
        assert_eq!(empty.count, 0);
    }
}
