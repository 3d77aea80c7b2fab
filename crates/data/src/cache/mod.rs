//! On-device local cache.
//!
//! A key-value mirror of the remote collections, persisted as a single JSON
//! document under the profile directory. This module is the only place that
//! touches the backing file; every caller goes through the typed slot API
//! below, and read-modify-write sequences run as one atomic step under the
//! cache's mutex (see [`LocalCache::update`]).
//!
//! Writes are atomic on disk (temp file + rename) and bump a per-slot
//! revision counter persisted next to the entries. Revisions exist purely to
//! signal changes to sibling processes sharing the profile (see
//! [`watcher`]); they take no part in conflict detection:
//! concurrent writers race and the last write wins.

pub mod watcher;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::error::CacheError;

/// File name of the cache document inside the profile directory.
const CACHE_FILE: &str = "cache.json";

/// The namespaced cache slots. One slot per mirrored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    Cart,
    Wishlist,
    Products,
    Orders,
    Customers,
    AdminNotifications,
    CurrentUser,
}

impl CacheSlot {
    /// Every slot, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::Cart,
        Self::Wishlist,
        Self::Products,
        Self::Orders,
        Self::Customers,
        Self::AdminNotifications,
        Self::CurrentUser,
    ];

    /// The namespaced key under which the slot is stored.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Customers => "customers",
            Self::AdminNotifications => "adminNotifications",
            Self::CurrentUser => "currentUser",
        }
    }

    /// Resolve a stored key back to its slot.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

/// The persisted document: entries plus per-slot revision counters.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    entries: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    revisions: BTreeMap<String, u64>,
}

/// The on-device cache, cheaply cloneable.
///
/// Every operation re-reads the backing file under the mutex, so a cache
/// handle always observes writes made by sibling processes sharing the
/// profile (last write wins, no merge).
#[derive(Clone)]
pub struct LocalCache {
    inner: Arc<LocalCacheInner>,
}

struct LocalCacheInner {
    path: PathBuf,
    /// Serializes this process's read-modify-write cycles.
    lock: Mutex<()>,
    /// Revision last written by this handle's process, per slot. The
    /// cross-process watcher uses it to skip changes we made ourselves.
    own_revisions: parking_lot::Mutex<BTreeMap<String, u64>>,
}

impl LocalCache {
    /// Open the cache for the given profile directory.
    ///
    /// No I/O happens until the first operation; a missing file reads as an
    /// empty cache and is created on first write.
    #[must_use]
    pub fn open(profile_dir: &Path) -> Self {
        Self {
            inner: Arc::new(LocalCacheInner {
                path: profile_dir.join(CACHE_FILE),
                lock: Mutex::new(()),
                own_revisions: parking_lot::Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Read a slot, decoding into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache file cannot be read or the stored
    /// entry does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, slot: CacheSlot) -> Result<Option<T>, CacheError> {
        let _guard = self.inner.lock.lock().await;
        let document = self.load().await?;
        match document.entries.get(slot.key()) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Write a slot, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the value cannot be serialized or the cache
    /// file cannot be written.
    pub async fn set<T: Serialize>(&self, slot: CacheSlot, value: &T) -> Result<(), CacheError> {
        let _guard = self.inner.lock.lock().await;
        let mut document = self.load().await?;
        document
            .entries
            .insert(slot.key().to_owned(), serde_json::to_value(value)?);
        self.commit(slot, document).await
    }

    /// Read-modify-write a slot as one atomic step.
    ///
    /// The closure receives the current value (or `None`) and returns the
    /// value to store. The cache mutex is held across the whole cycle, so
    /// concurrent in-process calls cannot lose each other's updates.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on read, decode, or write failure.
    pub async fn update<T, F>(&self, slot: CacheSlot, mutate: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let _guard = self.inner.lock.lock().await;
        let mut document = self.load().await?;
        let current = match document.entries.get(slot.key()) {
            Some(value) => Some(serde_json::from_value(value.clone())?),
            None => None,
        };
        let next = mutate(current);
        document
            .entries
            .insert(slot.key().to_owned(), serde_json::to_value(&next)?);
        self.commit(slot, document).await?;
        Ok(next)
    }

    /// Remove a slot entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on read or write failure.
    pub async fn remove(&self, slot: CacheSlot) -> Result<(), CacheError> {
        let _guard = self.inner.lock.lock().await;
        let mut document = self.load().await?;
        if document.entries.remove(slot.key()).is_none() {
            return Ok(());
        }
        self.commit(slot, document).await
    }

    /// Snapshot of the per-slot revision counters.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache file cannot be read.
    pub async fn revisions(&self) -> Result<BTreeMap<String, u64>, CacheError> {
        let _guard = self.inner.lock.lock().await;
        Ok(self.load().await?.revisions)
    }

    /// Revisions last written through this handle's process.
    pub(crate) fn own_revisions(&self) -> BTreeMap<String, u64> {
        self.inner.own_revisions.lock().clone()
    }

    /// Load the document from disk; a missing file is an empty cache.
    async fn load(&self) -> Result<CacheDocument, CacheError> {
        match tokio::fs::read(&self.inner.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CacheDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Bump the slot's revision and persist the document atomically
    /// (temp file + rename).
    async fn commit(&self, slot: CacheSlot, mut document: CacheDocument) -> Result<(), CacheError> {
        let revision = document
            .revisions
            .get(slot.key())
            .copied()
            .unwrap_or(0)
            .wrapping_add(1);
        document.revisions.insert(slot.key().to_owned(), revision);

        if let Some(parent) = self.inner.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(&document)?;
        let tmp = self.inner.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.inner.path).await?;

        self.inner
            .own_revisions
            .lock()
            .insert(slot.key().to_owned(), revision);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_cache() -> (tempfile::TempDir, LocalCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::open(dir.path());
        (dir, cache)
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (_dir, cache) = temp_cache();
        let value: Option<Vec<String>> = cache.get(CacheSlot::Products).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let (_dir, cache) = temp_cache();
        cache
            .set(CacheSlot::Products, &vec!["a".to_owned(), "b".to_owned()])
            .await
            .unwrap();
        let value: Option<Vec<String>> = cache.get(CacheSlot::Products).await.unwrap();
        assert_eq!(value.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_is_read_modify_write() {
        let (_dir, cache) = temp_cache();
        cache.set(CacheSlot::Orders, &vec![1_u32]).await.unwrap();
        let next = cache
            .update(CacheSlot::Orders, |current: Option<Vec<u32>>| {
                let mut list = current.unwrap_or_default();
                list.push(2);
                list
            })
            .await
            .unwrap();
        assert_eq!(next, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_revisions_bump_per_slot() {
        let (_dir, cache) = temp_cache();
        cache.set(CacheSlot::Cart, &"x").await.unwrap();
        cache.set(CacheSlot::Cart, &"y").await.unwrap();
        cache.set(CacheSlot::Orders, &"z").await.unwrap();
        let revisions = cache.revisions().await.unwrap();
        assert_eq!(revisions.get("cart"), Some(&2));
        assert_eq!(revisions.get("orders"), Some(&1));
    }

    #[tokio::test]
    async fn test_sibling_handle_sees_writes() {
        let (dir, cache) = temp_cache();
        cache.set(CacheSlot::Cart, &"from-a").await.unwrap();
        let sibling = LocalCache::open(dir.path());
        let value: Option<String> = sibling.get(CacheSlot::Cart).await.unwrap();
        assert_eq!(value.unwrap(), "from-a");
    }

    #[tokio::test]
    async fn test_remove_clears_slot() {
        let (_dir, cache) = temp_cache();
        cache.set(CacheSlot::Wishlist, &"w").await.unwrap();
        cache.remove(CacheSlot::Wishlist).await.unwrap();
        let value: Option<String> = cache.get(CacheSlot::Wishlist).await.unwrap();
        assert!(value.is_none());
    }
}
