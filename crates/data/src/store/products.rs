//! Product catalog accessor.
//!
//! Shared/global collection. Reads refresh the local mirror silently;
//! mutations write through and emit `ProductsUpdated`. The derived rating
//! fields are only ever written via [`ProductStore::apply_rating`], which
//! the review accessor drives; catalog callers must not edit them.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::instrument;

use blue_papaya_core::{Product, ProductId};

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::remote::{Collection, FetchOptions};

const SLOT: CacheSlot = CacheSlot::Products;

/// Accessor for the product catalog.
pub struct ProductStore<'a> {
    store: &'a Store,
}

impl<'a> ProductStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All catalog products, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Product>> {
        self.store.ensure_live()?;
        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_all::<Product>(Collection::Products, FetchOptions::newest_first())
                .await,
        );

        if let Some(products) = remote {
            self.store.ensure_live()?;
            self.store.cache().set(SLOT, &products).await?;
            return Ok(products);
        }

        Ok(self.store.cache().get(SLOT).await?.unwrap_or_default())
    }

    /// A single product by id; falls back to scanning the local mirror.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        self.store.ensure_live()?;
        if let Some(found) = remote_or_local(
            self.store
                .remote()
                .fetch_one::<Product>(Collection::Products, id.as_str())
                .await,
        ) {
            // Not-found is "empty", not an error, and not a fallback
            // trigger either: the remote answered.
            return Ok(found);
        }

        let cached: Vec<Product> = self.store.cache().get(SLOT).await?.unwrap_or_default();
        Ok(cached.into_iter().find(|product| &product.id == id))
    }

    /// Create or replace a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn upsert(&self, product: &Product) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .upsert(Collection::Products, product.id.as_str(), product)
                .await,
        );

        self.store.ensure_live()?;
        let replacement = product.clone();
        self.store
            .cache()
            .update(SLOT, move |products: Option<Vec<Product>>| {
                let mut products = products.unwrap_or_default();
                match products.iter_mut().find(|p| p.id == replacement.id) {
                    Some(existing) => *existing = replacement,
                    None => products.insert(0, replacement),
                }
                products
            })
            .await?;
        self.store.emit(StoreEvent::ProductsUpdated);
        Ok(())
    }

    /// Delete a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .delete(Collection::Products, id.as_str())
                .await,
        );

        self.store.ensure_live()?;
        let target = id.clone();
        self.store
            .cache()
            .update(SLOT, move |products: Option<Vec<Product>>| {
                let mut products = products.unwrap_or_default();
                products.retain(|product| product.id != target);
                products
            })
            .await?;
        self.store.emit(StoreEvent::ProductsUpdated);
        Ok(())
    }

    /// Write the derived rating fields. Only the review accessor calls
    /// this, as a side effect of review mutations.
    pub(crate) async fn apply_rating(
        &self,
        id: &ProductId,
        rating: Decimal,
        reviews_count: u32,
    ) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .update(
                    Collection::Products,
                    id.as_str(),
                    json!({ "rating": rating, "reviews_count": reviews_count }),
                )
                .await,
        );

        self.store.ensure_live()?;
        let target = id.clone();
        self.store
            .cache()
            .update(SLOT, move |products: Option<Vec<Product>>| {
                let mut products = products.unwrap_or_default();
                if let Some(product) = products.iter_mut().find(|p| p.id == target) {
                    product.rating = rating;
                    product.reviews_count = reviews_count;
                }
                products
            })
            .await?;
        self.store.emit(StoreEvent::ProductsUpdated);
        Ok(())
    }
}
