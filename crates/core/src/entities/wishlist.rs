//! Wishlist record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A saved-for-later product.
///
/// Wishlists are actor-scoped like carts, but have no quantity or variant:
/// adding an already-present product is a no-op (dedup by `item_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// The saved product.
    pub item_id: ProductId,
    /// Product display name, denormalized.
    pub display_name: String,
    /// Image reference (`bucket/path`).
    pub image_ref: Option<String>,
    /// Unit price when saved.
    pub unit_price: Price,
    /// When the item was saved.
    pub added_at: DateTime<Utc>,
}
