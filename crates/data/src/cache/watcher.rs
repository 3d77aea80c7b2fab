//! Cross-process change propagation.
//!
//! The browser-profile analog of a storage change notification: sibling
//! processes share the cache file, and each runs a watcher that polls the
//! per-slot revision counters. When a revision moves that this process did
//! not write itself, the watcher re-emits the slot's change event locally so
//! observers re-fetch from their own accessor, exactly as in-process
//! subscribers do.
//!
//! The watcher owns its task: dropping or shutting it down cancels the
//! polling loop, so no periodic work leaks past the observing component.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{CacheSlot, LocalCache};
use crate::events::{EventBus, StoreEvent};

/// Default revision poll period.
pub(crate) const DEFAULT_WATCH_PERIOD: Duration = Duration::from_secs(1);

/// The event re-emitted when a slot changes under a sibling process.
///
/// Creation events (`NewOrder`, `NewNotification`) cannot be reconstructed
/// from a revision bump alone, so the coarser update events stand in;
/// listeners re-derive state through the accessors either way.
const fn event_for(slot: CacheSlot) -> StoreEvent {
    match slot {
        CacheSlot::Cart => StoreEvent::CartUpdated,
        CacheSlot::Wishlist => StoreEvent::WishlistUpdated,
        CacheSlot::Products => StoreEvent::ProductsUpdated,
        CacheSlot::Orders => StoreEvent::OrdersUpdated,
        CacheSlot::AdminNotifications => StoreEvent::NotificationUpdated,
        CacheSlot::Customers | CacheSlot::CurrentUser => StoreEvent::CustomersUpdated,
    }
}

/// Handle to the background revision watcher.
pub struct CacheWatcher {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CacheWatcher {
    /// Spawn a watcher over `cache`, re-emitting change events on `events`.
    pub(crate) fn spawn(cache: LocalCache, events: EventBus, period: Duration) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut seen: Option<BTreeMap<String, u64>> = None;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let revisions = match cache.revisions().await {
                    Ok(revisions) => revisions,
                    Err(e) => {
                        debug!(error = %e, "cache watcher failed to read revisions");
                        continue;
                    }
                };

                let Some(previous) = seen.replace(revisions.clone()) else {
                    // First tick establishes the baseline; preexisting state
                    // is not a change.
                    continue;
                };

                let own = cache.own_revisions();
                for (key, revision) in &revisions {
                    let moved = previous.get(key) != Some(revision);
                    let ours = own.get(key) == Some(revision);
                    if moved && !ours
                        && let Some(slot) = CacheSlot::from_key(key)
                    {
                        events.emit(&event_for(slot));
                    }
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Cancel the watcher and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for CacheWatcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_sibling_write_is_re_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let ours = LocalCache::open(dir.path());
        let theirs = LocalCache::open(dir.path());
        let events = EventBus::new();

        let cart_events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cart_events);
        events.subscribe(move |event| {
            if *event == StoreEvent::CartUpdated {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let watcher = CacheWatcher::spawn(ours.clone(), events, Duration::from_millis(20));
        // Let the watcher establish its baseline.
        tokio::time::sleep(Duration::from_millis(60)).await;

        theirs.set(CacheSlot::Cart, &"sibling-write").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cart_events.load(Ordering::SeqCst) >= 1);

        watcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_own_writes_are_not_re_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path());
        let events = EventBus::new();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let watcher = CacheWatcher::spawn(cache.clone(), events, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;

        cache.set(CacheSlot::Cart, &"own-write").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        watcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_polling() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path());
        let sibling = LocalCache::open(dir.path());
        let events = EventBus::new();

        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        events.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let watcher = CacheWatcher::spawn(cache, events, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(60)).await;
        watcher.shutdown().await;

        sibling.set(CacheSlot::Orders, &"late").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
