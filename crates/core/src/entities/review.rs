//! Product review record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ActorKey, ProductId, Rating, ReviewId, ReviewStatus};

/// A customer review of a product.
///
/// Approval or rejection triggers recomputation of the owning product's
/// aggregate rating (mean of approved ratings) and review count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id.
    pub id: ReviewId,
    /// The reviewed product.
    pub product_id: ProductId,
    /// The reviewing actor, if one could be resolved.
    pub author: Option<ActorKey>,
    /// Star rating, 1-5.
    pub rating: Rating,
    /// Review text.
    pub comment: String,
    /// Moderation status.
    pub status: ReviewStatus,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Create a pending review with a fresh id and timestamp.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        author: Option<ActorKey>,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: ReviewId::new(Uuid::new_v4().to_string()),
            product_id,
            author,
            rating,
            comment: comment.into(),
            status: ReviewStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
