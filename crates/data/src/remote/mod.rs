//! Remote store adapter.
//!
//! Typed CRUD against named remote collections. The seam is split in two:
//!
//! - [`RemoteBackend`] - row-level operations over untyped JSON rows, one
//!   remote round trip per call. Implementations: [`RestBackend`] (the real
//!   managed database) and [`MemoryBackend`] (tests, offline demos).
//! - [`RemoteStore`] - the typed layer the accessors use; decodes rows into
//!   the `blue-papaya-core` record types and wraps failures in a
//!   [`RemoteError`] carrying collection, operation, and cause.

pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RemoteError, RemoteErrorKind, RemoteOp};

pub use memory::MemoryBackend;
pub use rest::RestBackend;

/// The named remote collections this client consumes.
///
/// Schema is owned by the database collaborator; this enum carries the
/// little the adapter needs to know: collection name, owner column for
/// actor- or parent-scoped queries, and the upsert conflict target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Orders,
    UserCarts,
    UserWishlists,
    AdminNotifications,
    ProductReviews,
    Customers,
}

impl Collection {
    /// Remote collection name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::UserCarts => "user_carts",
            Self::UserWishlists => "user_wishlists",
            Self::AdminNotifications => "admin_notifications",
            Self::ProductReviews => "product_reviews",
            Self::Customers => "customers",
        }
    }

    /// Column used for owner-scoped fetches, where the collection has one.
    #[must_use]
    pub const fn owner_field(&self) -> Option<&'static str> {
        match self {
            Self::Orders => Some("owner_email"),
            Self::UserCarts | Self::UserWishlists => Some("owner_key"),
            Self::ProductReviews => Some("product_id"),
            Self::Products | Self::AdminNotifications | Self::Customers => None,
        }
    }

    /// Column upserts resolve conflicts on: the owner column for
    /// owner-keyed collections, the primary key otherwise.
    #[must_use]
    pub const fn conflict_target(&self) -> &'static str {
        match self.owner_field() {
            Some(field) => field,
            None => "id",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for list fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Order by creation time, newest first.
    pub newest_first: bool,
    /// Cap the number of returned rows.
    pub limit: Option<usize>,
}

impl FetchOptions {
    /// Newest-first ordering with a row cap.
    #[must_use]
    pub const fn newest_first_capped(limit: usize) -> Self {
        Self {
            newest_first: true,
            limit: Some(limit),
        }
    }

    /// Newest-first ordering, uncapped.
    #[must_use]
    pub const fn newest_first() -> Self {
        Self {
            newest_first: true,
            limit: None,
        }
    }
}

/// Row-level operations every backend provides.
///
/// Each call is a single remote round trip. A single-row fetch that finds no
/// matching row returns `Ok(None)`; not-found is "empty", not an error.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetch all rows of a collection.
    async fn fetch_all(
        &self,
        collection: Collection,
        options: FetchOptions,
    ) -> Result<Vec<Value>, RemoteError>;

    /// Fetch a single row by primary key.
    async fn fetch_one(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, RemoteError>;

    /// Fetch the rows belonging to an owner key.
    async fn fetch_by_owner(
        &self,
        collection: Collection,
        owner_key: &str,
    ) -> Result<Vec<Value>, RemoteError>;

    /// Insert a new row.
    async fn insert(&self, collection: Collection, record: Value) -> Result<(), RemoteError>;

    /// Insert or replace the row whose conflict-target column equals `key`.
    async fn upsert(
        &self,
        collection: Collection,
        key: &str,
        record: Value,
    ) -> Result<(), RemoteError>;

    /// Patch fields of the row with the given primary key.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), RemoteError>;

    /// Delete the row with the given primary key.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError>;
}

/// The typed layer over a [`RemoteBackend`].
#[derive(Clone)]
pub struct RemoteStore {
    backend: Arc<dyn RemoteBackend>,
}

impl RemoteStore {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self { backend }
    }

    /// Fetch and decode all rows of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport failure or if a row does not
    /// decode as `T`.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
        options: FetchOptions,
    ) -> Result<Vec<T>, RemoteError> {
        let rows = self.backend.fetch_all(collection, options).await?;
        decode_rows(collection, RemoteOp::FetchAll, rows)
    }

    /// Fetch and decode a single row by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or decode failure.
    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, RemoteError> {
        match self.backend.fetch_one(collection, id).await? {
            Some(row) => Ok(Some(decode_row(collection, RemoteOp::FetchOne, row)?)),
            None => Ok(None),
        }
    }

    /// Fetch and decode the rows belonging to an owner key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport or decode failure.
    pub async fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner_key: &str,
    ) -> Result<Vec<T>, RemoteError> {
        let rows = self.backend.fetch_by_owner(collection, owner_key).await?;
        decode_rows(collection, RemoteOp::FetchByOwner, rows)
    }

    /// Insert a record.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on encode or transport failure.
    pub async fn insert<T: Serialize>(
        &self,
        collection: Collection,
        record: &T,
    ) -> Result<(), RemoteError> {
        let row = encode_row(collection, RemoteOp::Insert, record)?;
        self.backend.insert(collection, row).await
    }

    /// Insert or replace the record keyed by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on encode or transport failure.
    pub async fn upsert<T: Serialize>(
        &self,
        collection: Collection,
        key: &str,
        record: &T,
    ) -> Result<(), RemoteError> {
        let row = encode_row(collection, RemoteOp::Upsert, record)?;
        self.backend.upsert(collection, key, row).await
    }

    /// Patch fields of the row with the given primary key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport failure.
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), RemoteError> {
        self.backend.update(collection, id, patch).await
    }

    /// Delete the row with the given primary key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on transport failure.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.backend.delete(collection, id).await
    }
}

fn decode_row<T: DeserializeOwned>(
    collection: Collection,
    op: RemoteOp,
    row: Value,
) -> Result<T, RemoteError> {
    serde_json::from_value(row)
        .map_err(|e| RemoteError::new(collection.name(), op, RemoteErrorKind::Decode(e)))
}

fn decode_rows<T: DeserializeOwned>(
    collection: Collection,
    op: RemoteOp,
    rows: Vec<Value>,
) -> Result<Vec<T>, RemoteError> {
    rows.into_iter()
        .map(|row| decode_row(collection, op, row))
        .collect()
}

fn encode_row<T: Serialize>(
    collection: Collection,
    op: RemoteOp,
    record: &T,
) -> Result<Value, RemoteError> {
    serde_json::to_value(record)
        .map_err(|e| RemoteError::new(collection.name(), op, RemoteErrorKind::Decode(e)))
}
