//! Cart and cart line records.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, VariantSpec};

/// A single line in a cart.
///
/// Uniqueness invariant: a cart holds at most one line per
/// `(item_id, variant)` pair. Adding a duplicate increments `quantity`
/// rather than creating a new line (enforced by the cart merge policy, not
/// by this type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The product this line refers to.
    pub item_id: ProductId,
    /// Product display name, denormalized for offline rendering.
    pub display_name: String,
    /// Product brand, denormalized.
    pub brand: String,
    /// Image reference (`bucket/path`), resolved to a URL by the blob gateway.
    pub image_ref: Option<String>,
    /// Unit price at the time the line was added.
    pub unit_price: Price,
    /// Number of units. Always at least 1; removal is a distinct operation,
    /// never a quantity-of-zero state.
    pub quantity: u32,
    /// Selected product options distinguishing this line.
    #[serde(default)]
    pub variant: VariantSpec,
}

impl CartLine {
    /// The identity used by the merge policy: two lines merge exactly when
    /// both the product id and the variant spec match structurally.
    #[must_use]
    pub fn merge_key(&self) -> (&ProductId, &VariantSpec) {
        (&self.item_id, &self.variant)
    }
}

/// An ordered sequence of cart lines, owned by exactly one actor.
///
/// Mirrored both remotely (one `user_carts` row per actor) and locally
/// (single cache slot, last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CurrencyCode;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine {
            item_id: ProductId::new(id),
            display_name: id.to_owned(),
            brand: "Blue Papaya".to_owned(),
            image_ref: None,
            unit_price: Price::from_cents(1000, CurrencyCode::USD),
            quantity,
            variant: VariantSpec::new(),
        }
    }

    #[test]
    fn test_total_quantity_sums_lines() {
        let cart = Cart {
            lines: vec![line("a", 2), line("b", 3)],
        };
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_merge_key_distinguishes_variants() {
        let plain = line("a", 1);
        let mut sized = line("a", 1);
        sized.variant.set("size", "M");
        assert_ne!(plain.merge_key(), sized.merge_key());
    }
}
