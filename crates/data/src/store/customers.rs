//! Customer accessor.
//!
//! The shared `customers` collection backs the admin view; the local
//! `currentUser` slot holds this device's signed-in customer and feeds
//! tier (b) of actor resolution.

use tracing::instrument;

use blue_papaya_core::Customer;

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::identity::CurrentUser;
use crate::remote::{Collection, FetchOptions};

const SLOT: CacheSlot = CacheSlot::Customers;

/// Accessor for customers.
pub struct CustomerStore<'a> {
    store: &'a Store,
}

impl<'a> CustomerStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All customer records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Customer>> {
        self.store.ensure_live()?;
        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_all::<Customer>(Collection::Customers, FetchOptions::newest_first())
                .await,
        );

        if let Some(customers) = remote {
            self.store.ensure_live()?;
            self.store.cache().set(SLOT, &customers).await?;
            return Ok(customers);
        }

        Ok(self.store.cache().get(SLOT).await?.unwrap_or_default())
    }

    /// Create or update a customer record.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, customer), fields(id = %customer.id))]
    pub async fn upsert(&self, customer: &Customer) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .upsert(Collection::Customers, customer.id.as_str(), customer)
                .await,
        );

        self.store.ensure_live()?;
        let replacement = customer.clone();
        self.store
            .cache()
            .update(SLOT, move |customers: Option<Vec<Customer>>| {
                let mut customers = customers.unwrap_or_default();
                match customers.iter_mut().find(|c| c.id == replacement.id) {
                    Some(existing) => *existing = replacement,
                    None => customers.insert(0, replacement),
                }
                customers
            })
            .await?;
        self.store.emit(StoreEvent::CustomersUpdated);
        Ok(())
    }

    /// The locally persisted current user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>> {
        Ok(self.store.cache().get(CacheSlot::CurrentUser).await?)
    }

    /// Persist the current user record (on sign-in or profile refresh).
    /// Subsequent actor-scoped operations resolve to this user.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, user))]
    pub async fn set_current_user(&self, user: &CurrentUser) -> Result<()> {
        self.store.ensure_live()?;
        self.store.cache().set(CacheSlot::CurrentUser, user).await?;
        Ok(())
    }

    /// Forget the current user (on sign-out). The cart and wishlist slots
    /// are left in place; they simply stop syncing until the next sign-in.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn clear_current_user(&self) -> Result<()> {
        self.store.ensure_live()?;
        self.store.cache().remove(CacheSlot::CurrentUser).await?;
        Ok(())
    }
}
