//! In-memory backend.
//!
//! Used by tests and offline demos. Rows live in a `HashMap` keyed by
//! collection; a failing mode makes every operation answer
//! `RemoteErrorKind::Unavailable` to exercise the fallback orchestrator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{Collection, FetchOptions, RemoteBackend};
use crate::error::{RemoteError, RemoteErrorKind, RemoteOp};

/// In-memory remote store, cheaply cloneable.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    rows: Mutex<HashMap<Collection, Vec<Value>>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failing mode: while set, every operation fails with
    /// `Unavailable` without touching stored rows.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of rows currently stored in a collection.
    #[must_use]
    pub fn row_count(&self, collection: Collection) -> usize {
        self.state
            .rows
            .lock()
            .get(&collection)
            .map_or(0, Vec::len)
    }

    fn guard(&self, collection: Collection, op: RemoteOp) -> Result<(), RemoteError> {
        if self.state.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::new(
                collection.name(),
                op,
                RemoteErrorKind::Unavailable,
            ));
        }
        Ok(())
    }
}

/// String value of a row field, empty when absent.
fn field<'a>(row: &'a Value, name: &str) -> &'a str {
    row.get(name).and_then(Value::as_str).unwrap_or("")
}

/// Sort rows newest-first by their RFC 3339 `created_at` column; the
/// lexicographic order of the timestamps is chronological.
fn sort_newest_first(rows: &mut [Value]) {
    rows.sort_by(|a, b| field(b, "created_at").cmp(field(a, "created_at")));
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn fetch_all(
        &self,
        collection: Collection,
        options: FetchOptions,
    ) -> Result<Vec<Value>, RemoteError> {
        self.guard(collection, RemoteOp::FetchAll)?;
        let mut rows = self
            .state
            .rows
            .lock()
            .get(&collection)
            .cloned()
            .unwrap_or_default();
        if options.newest_first {
            sort_newest_first(&mut rows);
        }
        if let Some(limit) = options.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn fetch_one(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, RemoteError> {
        self.guard(collection, RemoteOp::FetchOne)?;
        Ok(self
            .state
            .rows
            .lock()
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| field(row, "id") == id).cloned()))
    }

    async fn fetch_by_owner(
        &self,
        collection: Collection,
        owner_key: &str,
    ) -> Result<Vec<Value>, RemoteError> {
        let op = RemoteOp::FetchByOwner;
        self.guard(collection, op)?;
        let Some(owner_field) = collection.owner_field() else {
            return Err(RemoteError::new(
                collection.name(),
                op,
                RemoteErrorKind::Unavailable,
            ));
        };
        let mut rows: Vec<Value> = self
            .state
            .rows
            .lock()
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| field(row, owner_field) == owner_key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<(), RemoteError> {
        self.guard(collection, RemoteOp::Insert)?;
        self.state
            .rows
            .lock()
            .entry(collection)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn upsert(
        &self,
        collection: Collection,
        key: &str,
        record: Value,
    ) -> Result<(), RemoteError> {
        self.guard(collection, RemoteOp::Upsert)?;
        let target = collection.conflict_target();
        let mut rows = self.state.rows.lock();
        let rows = rows.entry(collection).or_default();
        match rows.iter_mut().find(|row| field(row, target) == key) {
            Some(existing) => *existing = record,
            None => rows.push(record),
        }
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), RemoteError> {
        self.guard(collection, RemoteOp::Update)?;
        let mut rows = self.state.rows.lock();
        if let Some(rows) = rows.get_mut(&collection)
            && let Some(row) = rows.iter_mut().find(|row| field(row, "id") == id)
            && let (Value::Object(target), Value::Object(fields)) = (&mut *row, &patch)
        {
            for (name, value) in fields {
                target.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        self.guard(collection, RemoteOp::Delete)?;
        if let Some(rows) = self.state.rows.lock().get_mut(&collection) {
            rows.retain(|row| field(row, "id") != id);
        }
        Ok(())
    }
}
