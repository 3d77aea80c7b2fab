//! Cart accessor.
//!
//! Actor-scoped: the remote mirror is one `user_carts` row per actor, the
//! local mirror a single cache slot. Every mutation reads a fresh snapshot,
//! reconciles against it, and writes the full cart back, so within one
//! process, cart operations execute in call order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use blue_papaya_core::{Cart, CartLine};

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::reconcile;
use crate::remote::Collection;

const SLOT: CacheSlot = CacheSlot::Cart;

/// The `user_carts` row shape: one row per owner, items as an ordered list.
#[derive(Debug, Serialize, Deserialize)]
struct CartRow {
    owner_key: String,
    items: Vec<CartLine>,
    updated_at: DateTime<Utc>,
}

/// Accessor for the current actor's cart.
pub struct CartStore<'a> {
    store: &'a Store,
}

impl<'a> CartStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The combined cart read.
    ///
    /// With no resolvable actor the remote is skipped entirely. Otherwise
    /// the remote copy is preferred only when it is non-empty: an empty
    /// remote cart must not clobber a non-empty local cache (a newly added
    /// item would vanish under a stale empty snapshot during a slow round
    /// trip).
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Cart> {
        self.store.ensure_live()?;
        let local: Option<Cart> = self.store.cache().get(SLOT).await?;

        let Some(actor) = self.store.resolve_actor().await else {
            return Ok(local.unwrap_or_default());
        };

        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_by_owner::<CartRow>(Collection::UserCarts, actor.as_str())
                .await,
        )
        .and_then(|rows| rows.into_iter().next())
        .map(|row| Cart { lines: row.items });

        match (remote, local) {
            (Some(remote), _) if !remote.is_empty() => {
                self.store.ensure_live()?;
                // Read-through mirror: the cache is never older than the
                // last successful remote read.
                self.store.cache().set(SLOT, &remote).await?;
                Ok(remote)
            }
            (_, Some(local)) => Ok(local),
            (Some(remote), None) => Ok(remote),
            (None, None) => Ok(Cart::new()),
        }
    }

    /// Add a line, merging with an existing `(item_id, variant)` match.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, line), fields(item_id = %line.item_id))]
    pub async fn add_line(&self, line: CartLine) -> Result<Cart> {
        let mut cart = self.get().await?;
        reconcile::merge_line(&mut cart, line);
        self.persist(cart).await
    }

    /// Remove the line at `index`. Out-of-bounds indexes leave the cart
    /// unchanged (but still persist the freshly read snapshot).
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn remove_line(&self, index: usize) -> Result<Cart> {
        let mut cart = self.get().await?;
        reconcile::remove_line(&mut cart, index);
        self.persist(cart).await
    }

    /// Adjust the quantity of the line at `index` by `delta`, clamping to a
    /// minimum of 1.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn adjust_quantity(&self, index: usize, delta: i64) -> Result<Cart> {
        let mut cart = self.get().await?;
        reconcile::adjust_quantity(&mut cart, index, delta);
        self.persist(cart).await
    }

    /// Empty the cart (e.g. after checkout).
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart> {
        self.store.ensure_live()?;
        self.persist(Cart::new()).await
    }

    /// Total number of units across all lines.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    pub async fn total_quantity(&self) -> Result<u32> {
        Ok(self.get().await?.total_quantity())
    }

    /// Write the full cart value: remote upsert where an actor resolves
    /// (failure falls back silently), then the local write-through and the
    /// change event: the mutation appears to succeed once the local leg
    /// completes.
    async fn persist(&self, cart: Cart) -> Result<Cart> {
        self.store.ensure_live()?;
        if let Some(actor) = self.store.resolve_actor().await {
            let row = CartRow {
                owner_key: actor.to_string(),
                items: cart.lines.clone(),
                updated_at: Utc::now(),
            };
            let _ = remote_or_local(
                self.store
                    .remote()
                    .upsert(Collection::UserCarts, actor.as_str(), &row)
                    .await,
            );
        }

        self.store.ensure_live()?;
        self.store.cache().set(SLOT, &cart).await?;
        self.store.emit(StoreEvent::CartUpdated);
        Ok(cart)
    }
}
