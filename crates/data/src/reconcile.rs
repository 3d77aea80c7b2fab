//! Cart merge policy.
//!
//! The one collection that needs element-level reconciliation when remote
//! and local copies meet. Everything here is pure: callers read a fresh
//! cart snapshot, apply one of these mutations, and write the full value
//! back through the cache/remote layer.

use blue_papaya_core::{Cart, CartLine};

/// Merge a line into the cart.
///
/// Scans existing lines for an exact `(item_id, variant)` match using
/// structural equality of the variant spec. On a match the incoming
/// quantity (at least 1) is added to the existing line; otherwise the line
/// is appended. A cart therefore never holds two lines with the same merge
/// key.
pub fn merge_line(cart: &mut Cart, incoming: CartLine) {
    let quantity = incoming.quantity.max(1);
    match cart
        .lines
        .iter_mut()
        .find(|line| line.merge_key() == incoming.merge_key())
    {
        Some(line) => line.quantity += quantity,
        None => {
            let mut line = incoming;
            line.quantity = quantity;
            cart.lines.push(line);
        }
    }
}

/// Remove the line at `index`, returning it.
///
/// Returns `None` (cart unchanged) when the index is out of bounds.
pub fn remove_line(cart: &mut Cart, index: usize) -> Option<CartLine> {
    if index < cart.lines.len() {
        Some(cart.lines.remove(index))
    } else {
        None
    }
}

/// Adjust the quantity of the line at `index` by `delta`, clamping to a
/// minimum of 1. Removal is a distinct operation, not a quantity-of-zero
/// state.
///
/// Returns `false` (cart unchanged) when the index is out of bounds.
pub fn adjust_quantity(cart: &mut Cart, index: usize, delta: i64) -> bool {
    let Some(line) = cart.lines.get_mut(index) else {
        return false;
    };
    let next = i64::from(line.quantity).saturating_add(delta).max(1);
    // Clamped below at 1 and a u32 going in, so the cast cannot truncate
    // unless the delta overflows u32 range; saturate there as well.
    line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blue_papaya_core::{CurrencyCode, Price, ProductId, VariantSpec};

    fn line(id: &str, quantity: u32, variant: VariantSpec) -> CartLine {
        CartLine {
            item_id: ProductId::new(id),
            display_name: id.to_owned(),
            brand: "Blue Papaya".to_owned(),
            image_ref: None,
            unit_price: Price::from_cents(1250, CurrencyCode::USD),
            quantity,
            variant,
        }
    }

    #[test]
    fn test_duplicate_add_increments_quantity() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 1, VariantSpec::new()));
        merge_line(&mut cart, line("A", 2, VariantSpec::new()));
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 3);
    }

    #[test]
    fn test_distinct_variants_get_distinct_lines() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 1, VariantSpec::new()));
        merge_line(&mut cart, line("A", 1, VariantSpec::new().with("size", "M")));
        assert_eq!(cart.lines.len(), 2);
    }

    #[test]
    fn test_variant_equality_is_structural() {
        let mut cart = Cart::new();
        merge_line(
            &mut cart,
            line("A", 1, VariantSpec::new().with("size", "M").with("color", "teal")),
        );
        merge_line(
            &mut cart,
            line("A", 1, VariantSpec::new().with("color", "teal").with("size", "M")),
        );
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[test]
    fn test_zero_quantity_add_counts_as_one() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 0, VariantSpec::new()));
        assert_eq!(cart.lines[0].quantity, 1);
    }

    #[test]
    fn test_remove_line_by_position() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 1, VariantSpec::new()));
        merge_line(&mut cart, line("B", 1, VariantSpec::new()));
        let removed = remove_line(&mut cart, 0).unwrap();
        assert_eq!(removed.item_id, ProductId::new("A"));
        assert_eq!(cart.lines.len(), 1);
        assert!(remove_line(&mut cart, 5).is_none());
    }

    #[test]
    fn test_quantity_clamps_at_one() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 2, VariantSpec::new()));
        assert!(adjust_quantity(&mut cart, 0, -10));
        assert_eq!(cart.lines[0].quantity, 1);
    }

    #[test]
    fn test_quantity_adjusts_up_and_down() {
        let mut cart = Cart::new();
        merge_line(&mut cart, line("A", 2, VariantSpec::new()));
        assert!(adjust_quantity(&mut cart, 0, 3));
        assert_eq!(cart.lines[0].quantity, 5);
        assert!(adjust_quantity(&mut cart, 0, -2));
        assert_eq!(cart.lines[0].quantity, 3);
        assert!(!adjust_quantity(&mut cart, 9, 1));
    }
}
