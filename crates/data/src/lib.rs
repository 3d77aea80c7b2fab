//! Blue Papaya Data - the dual-persistence storefront data layer.
//!
//! Keeps a remote authoritative store and an on-device cache mutually
//! consistent while surviving remote unavailability. Concurrent cart
//! mutations merge idempotently, and change notifications fan out to
//! decoupled observers (including sibling processes sharing the profile)
//! without a central coordinator.
//!
//! # Architecture
//!
//! A mutation enters through a collection accessor ([`Store::cart`],
//! [`Store::orders`], ...) → the identity resolver supplies the actor key →
//! the remote store adapter attempts the write → on failure the call falls
//! back to the local cache and continues → the cart reconciler applies
//! merge semantics where applicable → the event bus broadcasts the change →
//! the local cache is updated as a read-through mirror regardless of which
//! path succeeded.
//!
//! UI actions that depend on a write always appear to succeed once the
//! local write-through completes: the contract is "never block the user on
//! remote availability". There is no cross-process or cross-device
//! transactional guarantee: concurrent writers race and the last write
//! wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use blue_papaya_data::{DataConfig, Store, StoreEvent};
//!
//! let config = DataConfig::from_env()?;
//! let store = Store::new(&config);
//!
//! store.events().subscribe(|event| {
//!     if *event == StoreEvent::CartUpdated {
//!         // re-derive the view through the accessor
//!     }
//! });
//!
//! let cart = store.cart().add_line(line).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod blob;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod reconcile;
pub mod remote;
pub mod store;

pub use blob::{BlobError, BlobGateway, SignedUrlCache};
pub use cache::watcher::CacheWatcher;
pub use cache::{CacheSlot, LocalCache};
pub use config::DataConfig;
pub use error::{CacheError, ConfigError, DataError, RemoteError, RemoteErrorKind, RemoteOp};
pub use events::{EventBus, StoreEvent, SubscriberId};
pub use identity::{CurrentUser, IdentityResolver, SessionProvider};
pub use remote::{
    Collection, FetchOptions, MemoryBackend, RemoteBackend, RemoteStore, RestBackend,
};
pub use store::{
    CartStore, CustomerStore, NotificationPoller, NotificationStore, OrderStore, ProductStore,
    ReviewStore, Store, WishlistStore, NOTIFICATION_READ_CAP,
};
