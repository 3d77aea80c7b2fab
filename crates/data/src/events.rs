//! Typed publish/subscribe for store change notifications.
//!
//! Writers emit a [`StoreEvent`] synchronously after a successful
//! write-through to the local cache, regardless of whether the remote or the
//! fallback path carried the write. Subscribers are expected to re-derive
//! their view by re-invoking the relevant accessor rather than consuming
//! event payloads as the source of truth; payloads, where present, are an
//! optimization, not a contract.
//!
//! Snapshot-on-emit semantics:
//! - A listener removed *during* emission is still called in that round.
//! - A listener added *during* emission is not called until the next emit.
//!
//! The listener lock is released before any callback runs, so callbacks may
//! freely call [`EventBus::subscribe`] / [`EventBus::unsubscribe`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use blue_papaya_core::{NotificationId, OrderId};

/// The closed set of change notifications the store can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Any cart mutation.
    CartUpdated,
    /// Any wishlist mutation.
    WishlistUpdated,
    /// Catalog changed (product upsert/delete, rating recompute).
    ProductsUpdated,
    /// Order list changed (creation or status transition).
    OrdersUpdated,
    /// An order was created.
    NewOrder {
        /// The created order.
        order_id: OrderId,
    },
    /// A notification was created.
    NewNotification {
        /// The created notification.
        notification_id: NotificationId,
    },
    /// A notification was read or deleted.
    NotificationUpdated,
    /// A customer record was created or updated.
    CustomersUpdated,
}

/// A subscriber handle returned by [`EventBus::subscribe`] that can be passed
/// to [`EventBus::unsubscribe`].
pub type SubscriberId = u64;

type ListenerFn = dyn Fn(&StoreEvent) + Send + Sync;

/// In-process event fan-out, cheaply cloneable.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Default)]
struct EventBusInner {
    listeners: Mutex<Vec<(SubscriberId, Arc<ListenerFn>)>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a new, empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` and return its [`SubscriberId`].
    pub fn subscribe(&self, callback: impl Fn(&StoreEvent) + Send + Sync + 'static) -> SubscriberId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.listeners.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove the subscriber identified by `id`.
    ///
    /// Does nothing if `id` is not present (safe to call multiple times).
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.listeners.lock().retain(|(sid, _)| *sid != id);
    }

    /// Emit `event` to all currently registered subscribers, synchronously.
    pub fn emit(&self, event: &StoreEvent) {
        // Snapshot Arc references under the lock (cheap: just ref-count bumps).
        let snapshot: Vec<Arc<ListenerFn>> = {
            let guard = self.inner.listeners.lock();
            guard.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        // Lock is released; callbacks can safely subscribe/unsubscribe.
        for cb in snapshot {
            cb(event);
        }
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Whether the bus has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
