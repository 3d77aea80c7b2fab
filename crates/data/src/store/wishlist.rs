//! Wishlist accessor.
//!
//! Actor-scoped like the cart, with the same read policy, but without
//! quantities: adding an already-saved product is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use blue_papaya_core::{ProductId, WishlistItem};

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::remote::Collection;

const SLOT: CacheSlot = CacheSlot::Wishlist;

/// The `user_wishlists` row shape: one row per owner.
#[derive(Debug, Serialize, Deserialize)]
struct WishlistRow {
    owner_key: String,
    items: Vec<WishlistItem>,
    updated_at: DateTime<Utc>,
}

/// Accessor for the current actor's wishlist.
pub struct WishlistStore<'a> {
    store: &'a Store,
}

impl<'a> WishlistStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The combined wishlist read; same preference rules as the cart.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Vec<WishlistItem>> {
        self.store.ensure_live()?;
        let local: Option<Vec<WishlistItem>> = self.store.cache().get(SLOT).await?;

        let Some(actor) = self.store.resolve_actor().await else {
            return Ok(local.unwrap_or_default());
        };

        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_by_owner::<WishlistRow>(Collection::UserWishlists, actor.as_str())
                .await,
        )
        .and_then(|rows| rows.into_iter().next())
        .map(|row| row.items);

        match (remote, local) {
            (Some(remote), _) if !remote.is_empty() => {
                self.store.ensure_live()?;
                self.store.cache().set(SLOT, &remote).await?;
                Ok(remote)
            }
            (_, Some(local)) => Ok(local),
            (Some(remote), None) => Ok(remote),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// Save a product. A product already on the list stays where it is.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, item), fields(item_id = %item.item_id))]
    pub async fn add(&self, item: WishlistItem) -> Result<Vec<WishlistItem>> {
        let mut items = self.get().await?;
        if items.iter().any(|existing| existing.item_id == item.item_id) {
            return Ok(items);
        }
        items.push(item);
        self.persist(items).await
    }

    /// Remove a saved product by id.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(&self, item_id: &ProductId) -> Result<Vec<WishlistItem>> {
        let mut items = self.get().await?;
        items.retain(|item| &item.item_id != item_id);
        self.persist(items).await
    }

    /// Whether a product is on the list.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    pub async fn contains(&self, item_id: &ProductId) -> Result<bool> {
        Ok(self.get().await?.iter().any(|item| &item.item_id == item_id))
    }

    async fn persist(&self, items: Vec<WishlistItem>) -> Result<Vec<WishlistItem>> {
        self.store.ensure_live()?;
        if let Some(actor) = self.store.resolve_actor().await {
            let row = WishlistRow {
                owner_key: actor.to_string(),
                items: items.clone(),
                updated_at: Utc::now(),
            };
            let _ = remote_or_local(
                self.store
                    .remote()
                    .upsert(Collection::UserWishlists, actor.as_str(), &row)
                    .await,
            );
        }

        self.store.ensure_live()?;
        self.store.cache().set(SLOT, &items).await?;
        self.store.emit(StoreEvent::WishlistUpdated);
        Ok(items)
    }
}
