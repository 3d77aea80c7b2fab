//! The store: shared state plus the collection accessors.
//!
//! [`Store`] wires the remote adapter, local cache, event bus, and identity
//! resolver together and hands out per-collection accessors. Every accessor
//! follows one fallback policy: try the remote store; on any failure, or
//! when no actor resolves for an actor-scoped collection, read/write the
//! local cache instead and continue. Callers never observe remote-vs-local
//! as a distinct state; `Err` is reserved for local cache I/O failure and
//! aborts.

mod cart;
mod customers;
mod notifications;
mod orders;
mod products;
mod reviews;
mod wishlist;

pub use cart::CartStore;
pub use customers::CustomerStore;
pub use notifications::{NotificationPoller, NotificationStore, NOTIFICATION_READ_CAP};
pub use orders::OrderStore;
pub use products::ProductStore;
pub use reviews::ReviewStore;
pub use wishlist::WishlistStore;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use blue_papaya_core::ActorKey;

use crate::cache::watcher::{CacheWatcher, DEFAULT_WATCH_PERIOD};
use crate::cache::LocalCache;
use crate::config::DataConfig;
use crate::error::{DataError, RemoteError};
use crate::events::{EventBus, StoreEvent};
use crate::identity::{IdentityResolver, SessionProvider};
use crate::remote::{RemoteBackend, RemoteStore, RestBackend};

/// Convert a remote outcome into the fallback decision: `Some` on success,
/// `None` (logged) on failure. The caller continues on the local cache.
pub(crate) fn remote_or_local<T>(result: Result<T, RemoteError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                collection = e.collection,
                op = %e.op,
                error = %e,
                "remote store unavailable; continuing on local cache"
            );
            None
        }
    }
}

/// Shared data layer state, cheaply cloneable.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    remote: RemoteStore,
    cache: LocalCache,
    events: EventBus,
    identity: IdentityResolver,
    abort: CancellationToken,
    notify_poll: Duration,
}

impl Store {
    /// Create a store over the real remote backend, with no session
    /// collaborator (identity resolves from the cached current user only).
    #[must_use]
    pub fn new(config: &DataConfig) -> Self {
        Self::with_parts(config, Arc::new(RestBackend::new(config)), None)
    }

    /// Create a store over an explicit backend and optional session
    /// collaborator. This is the constructor embedders and tests use.
    #[must_use]
    pub fn with_parts(
        config: &DataConfig,
        backend: Arc<dyn RemoteBackend>,
        session: Option<Arc<dyn SessionProvider>>,
    ) -> Self {
        let cache = LocalCache::open(&config.profile_dir);
        let identity = IdentityResolver::new(session, cache.clone());
        Self {
            inner: Arc::new(StoreInner {
                remote: RemoteStore::new(backend),
                cache,
                events: EventBus::new(),
                identity,
                abort: CancellationToken::new(),
                notify_poll: config.notify_poll,
            }),
        }
    }

    /// A handle whose operations observe `token`: once the token is
    /// cancelled, in-flight operations stop before committing results
    /// (caches and observers are left untouched) and fail with
    /// [`DataError::Aborted`].
    #[must_use]
    pub fn with_abort(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                remote: self.inner.remote.clone(),
                cache: self.inner.cache.clone(),
                events: self.inner.events.clone(),
                identity: self.inner.identity.clone(),
                abort: token,
                notify_poll: self.inner.notify_poll,
            }),
        }
    }

    /// The event bus observers subscribe on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// The local cache (the narrow choke-point API; the backing file is not
    /// reachable any other way).
    #[must_use]
    pub fn cache(&self) -> &LocalCache {
        &self.inner.cache
    }

    /// The typed remote store, for embedders composing their own flows.
    #[must_use]
    pub fn remote(&self) -> &RemoteStore {
        &self.inner.remote
    }

    /// Resolve the current actor (fresh on every call).
    pub async fn resolve_actor(&self) -> Option<ActorKey> {
        self.inner.identity.resolve().await
    }

    /// Spawn the cross-process change watcher for this store's profile.
    #[must_use]
    pub fn watch_cross_process(&self) -> CacheWatcher {
        CacheWatcher::spawn(
            self.inner.cache.clone(),
            self.inner.events.clone(),
            DEFAULT_WATCH_PERIOD,
        )
    }

    /// Cart accessor (actor-scoped).
    #[must_use]
    pub const fn cart(&self) -> CartStore<'_> {
        CartStore::new(self)
    }

    /// Wishlist accessor (actor-scoped).
    #[must_use]
    pub const fn wishlist(&self) -> WishlistStore<'_> {
        WishlistStore::new(self)
    }

    /// Order accessor.
    #[must_use]
    pub const fn orders(&self) -> OrderStore<'_> {
        OrderStore::new(self)
    }

    /// Product catalog accessor.
    #[must_use]
    pub const fn products(&self) -> ProductStore<'_> {
        ProductStore::new(self)
    }

    /// Admin notification accessor.
    #[must_use]
    pub const fn notifications(&self) -> NotificationStore<'_> {
        NotificationStore::new(self)
    }

    /// Product review accessor.
    #[must_use]
    pub const fn reviews(&self) -> ReviewStore<'_> {
        ReviewStore::new(self)
    }

    /// Customer accessor.
    #[must_use]
    pub const fn customers(&self) -> CustomerStore<'_> {
        CustomerStore::new(self)
    }

    /// Period of the notification polling backstop.
    pub(crate) fn notify_poll(&self) -> Duration {
        self.inner.notify_poll
    }

    /// Liveness check before committing results. See [`Store::with_abort`].
    pub(crate) fn ensure_live(&self) -> Result<(), DataError> {
        if self.inner.abort.is_cancelled() {
            Err(DataError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Emit a change event after a successful cache write-through.
    pub(crate) fn emit(&self, event: StoreEvent) {
        self.inner.events.emit(&event);
    }
}
