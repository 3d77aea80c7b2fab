//! Product review accessor.
//!
//! Reviews live only in the remote collection: there is no local mirror
//! slot, so a remote outage degrades reads to an empty list and drops
//! writes (logged). Approval and rejection recompute the owning product's
//! aggregate rating as a side effect; that derived state flows through
//! [`super::ProductStore::apply_rating`], never through catalog code.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{instrument, warn};

use blue_papaya_core::{ProductId, Rating, Review, ReviewId, ReviewStatus};

use super::{remote_or_local, Store};
use crate::error::Result;
use crate::remote::Collection;

/// Accessor for product reviews.
pub struct ReviewStore<'a> {
    store: &'a Store,
}

impl<'a> ReviewStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All reviews of a product, newest first. Empty when the remote is
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns an error only on abort.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_for_product(&self, product_id: &ProductId) -> Result<Vec<Review>> {
        self.store.ensure_live()?;
        Ok(remote_or_local(
            self.store
                .remote()
                .fetch_by_owner::<Review>(Collection::ProductReviews, product_id.as_str())
                .await,
        )
        .unwrap_or_default())
    }

    /// Submit a review. It enters moderation as `pending` and does not
    /// affect the product's aggregate rating until approved.
    ///
    /// # Errors
    ///
    /// Returns an error only on abort.
    #[instrument(skip(self, comment), fields(product_id = %product_id))]
    pub async fn submit(
        &self,
        product_id: ProductId,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Result<Review> {
        self.store.ensure_live()?;
        let author = self.store.resolve_actor().await;
        let review = Review::new(product_id, author, rating, comment);

        if remote_or_local(
            self.store
                .remote()
                .insert(Collection::ProductReviews, &review)
                .await,
        )
        .is_none()
        {
            warn!(review_id = %review.id, "review submission not persisted remotely");
        }
        Ok(review)
    }

    /// Approve or reject a review, then recompute the owning product's
    /// aggregate rating and count.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id, status = ?status))]
    pub async fn set_status(&self, id: &ReviewId, status: ReviewStatus) -> Result<()> {
        self.store.ensure_live()?;
        let review = remote_or_local(
            self.store
                .remote()
                .fetch_one::<Review>(Collection::ProductReviews, id.as_str())
                .await,
        )
        .flatten();

        let _ = remote_or_local(
            self.store
                .remote()
                .update(
                    Collection::ProductReviews,
                    id.as_str(),
                    json!({ "status": status }),
                )
                .await,
        );

        if let Some(review) = review {
            self.recompute_product(&review.product_id).await?;
        }
        Ok(())
    }

    /// Delete a review, then recompute the owning product's aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ReviewId) -> Result<()> {
        self.store.ensure_live()?;
        let review = remote_or_local(
            self.store
                .remote()
                .fetch_one::<Review>(Collection::ProductReviews, id.as_str())
                .await,
        )
        .flatten();

        let _ = remote_or_local(
            self.store
                .remote()
                .delete(Collection::ProductReviews, id.as_str())
                .await,
        );

        if let Some(review) = review {
            self.recompute_product(&review.product_id).await?;
        }
        Ok(())
    }

    /// Recompute a product's derived rating fields: the mean of approved
    /// ratings rounded to two places (zero with no approved reviews) and
    /// the approved count.
    async fn recompute_product(&self, product_id: &ProductId) -> Result<()> {
        let reviews = self.get_for_product(product_id).await?;
        let approved: Vec<&Review> = reviews
            .iter()
            .filter(|review| review.status == ReviewStatus::Approved)
            .collect();

        let count = u32::try_from(approved.len()).unwrap_or(u32::MAX);
        let rating = if approved.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = approved
                .iter()
                .map(|review| Decimal::from(review.rating.value()))
                .sum();
            (sum / Decimal::from(approved.len())).round_dp(2)
        };

        self.store
            .products()
            .apply_rating(product_id, rating, count)
            .await
    }
}
