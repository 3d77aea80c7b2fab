//! Product catalog record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A catalog product.
///
/// `rating` and `reviews_count` are derived values recomputed by the review
/// subsystem as a side effect of review mutations (insert, status change,
/// delete). Catalog code never edits them directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id (remote primary key).
    pub id: ProductId,
    /// Display name.
    pub display_name: String,
    /// Brand name.
    pub brand: String,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Image reference (`bucket/path`).
    pub image_ref: Option<String>,
    /// Current unit price.
    pub unit_price: Price,
    /// Mean rating of approved reviews, rounded to two places. Zero when the
    /// product has no approved reviews.
    #[serde(default)]
    pub rating: Decimal,
    /// Number of approved reviews.
    #[serde(default)]
    pub reviews_count: u32,
    /// When the product was added to the catalog.
    pub created_at: DateTime<Utc>,
}
