//! Order accessor.
//!
//! Orders are remote-authoritative; the local mirror is a read fallback
//! only. Creation fires `NewOrder` and raises an order notification; the
//! status field changes only through [`OrderStore::update_status`].

use chrono::Utc;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use blue_papaya_core::{
    CartLine, Email, NotificationKind, Order, OrderId, OrderStatus, Price,
};

use super::{remote_or_local, Store};
use crate::cache::CacheSlot;
use crate::error::Result;
use crate::events::StoreEvent;
use crate::remote::{Collection, FetchOptions};

const SLOT: CacheSlot = CacheSlot::Orders;

/// Accessor for orders.
pub struct OrderStore<'a> {
    store: &'a Store,
}

impl<'a> OrderStore<'a> {
    pub(crate) const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Order>> {
        self.store.ensure_live()?;
        let remote = remote_or_local(
            self.store
                .remote()
                .fetch_all::<Order>(Collection::Orders, FetchOptions::newest_first())
                .await,
        );

        if let Some(orders) = remote {
            self.store.ensure_live()?;
            self.store.cache().set(SLOT, &orders).await?;
            return Ok(orders);
        }

        Ok(self.store.cache().get(SLOT).await?.unwrap_or_default())
    }

    /// Orders placed by one customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(owner = %owner_email))]
    pub async fn get_for(&self, owner_email: &Email) -> Result<Vec<Order>> {
        self.store.ensure_live()?;
        if let Some(orders) = remote_or_local(
            self.store
                .remote()
                .fetch_by_owner::<Order>(Collection::Orders, owner_email.as_str())
                .await,
        ) {
            return Ok(orders);
        }

        let cached: Vec<Order> = self.store.cache().get(SLOT).await?.unwrap_or_default();
        Ok(cached
            .into_iter()
            .filter(|order| &order.owner_email == owner_email)
            .collect())
    }

    /// Place an order.
    ///
    /// Fires `OrdersUpdated` and `NewOrder`, and raises an order
    /// notification for the back office.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self, lines, total), fields(owner = %owner_email))]
    pub async fn create(
        &self,
        owner_email: Email,
        lines: Vec<CartLine>,
        total: Price,
    ) -> Result<Order> {
        self.store.ensure_live()?;
        let order = Order {
            id: OrderId::new(Uuid::new_v4().to_string()),
            owner_email,
            lines,
            total,
            status: OrderStatus::Created,
            created_at: Utc::now(),
        };

        let _ = remote_or_local(self.store.remote().insert(Collection::Orders, &order).await);

        self.store.ensure_live()?;
        let stored = order.clone();
        self.store
            .cache()
            .update(SLOT, move |orders: Option<Vec<Order>>| {
                let mut orders = orders.unwrap_or_default();
                orders.insert(0, stored);
                orders
            })
            .await?;

        self.store.emit(StoreEvent::OrdersUpdated);
        self.store.emit(StoreEvent::NewOrder {
            order_id: order.id.clone(),
        });

        // Domain event: a new order raises a back-office notification.
        self.store
            .notifications()
            .create(
                NotificationKind::Order,
                "New order",
                format!(
                    "Order for {} ({} items, {})",
                    order.owner_email,
                    order.total_quantity(),
                    order.total
                ),
                Some(json!({ "order_id": order.id })),
            )
            .await?;

        Ok(order)
    }

    /// Transition an order's status.
    ///
    /// # Errors
    ///
    /// Returns an error only on local cache failure or abort.
    #[instrument(skip(self), fields(id = %id, status = ?status))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<()> {
        self.store.ensure_live()?;
        let _ = remote_or_local(
            self.store
                .remote()
                .update(
                    Collection::Orders,
                    id.as_str(),
                    json!({ "status": status }),
                )
                .await,
        );

        self.store.ensure_live()?;
        let target = id.clone();
        self.store
            .cache()
            .update(SLOT, move |orders: Option<Vec<Order>>| {
                let mut orders = orders.unwrap_or_default();
                if let Some(order) = orders.iter_mut().find(|order| order.id == target) {
                    order.status = status;
                }
                orders
            })
            .await?;
        self.store.emit(StoreEvent::OrdersUpdated);
        Ok(())
    }
}
