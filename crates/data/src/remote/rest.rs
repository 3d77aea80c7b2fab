//! REST backend for the managed remote database.
//!
//! Speaks a PostgREST-style row API: one route per collection under
//! `/rest/v1/`, equality filters as `column=eq.value` query parameters, and
//! `Prefer: resolution=merge-duplicates` for upserts.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

use super::{Collection, FetchOptions, RemoteBackend};
use crate::config::DataConfig;
use crate::error::{RemoteError, RemoteErrorKind, RemoteOp};

/// Backend for the managed remote database.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl RestBackend {
    /// Create a backend from configuration.
    #[must_use]
    pub fn new(config: &DataConfig) -> Self {
        Self {
            inner: Arc::new(RestBackendInner {
                client: reqwest::Client::new(),
                base_url: config.remote_url.as_str().trim_end_matches('/').to_owned(),
                api_key: config.remote_key.clone(),
            }),
        }
    }

    fn endpoint(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.inner.base_url, collection.name())
    }

    /// Send a prepared request and parse the row payload.
    ///
    /// The body is read as text first so non-success responses and decode
    /// failures can be logged with their payload.
    async fn execute(
        &self,
        collection: Collection,
        op: RemoteOp,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<Value>, RemoteError> {
        let err = |kind| RemoteError::new(collection.name(), op, kind);

        let response = request
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(self.inner.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| err(RemoteErrorKind::Http(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| err(RemoteErrorKind::Http(e)))?;

        if !status.is_success() {
            tracing::warn!(
                collection = collection.name(),
                op = %op,
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "remote returned non-success status"
            );
            return Err(err(RemoteErrorKind::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }));
        }

        // Write operations answer 201/204 with an empty body.
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return Ok(Vec::new());
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| err(RemoteErrorKind::Decode(e)))?;
        match payload {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

#[async_trait]
impl RemoteBackend for RestBackend {
    #[instrument(skip(self), fields(collection = collection.name()))]
    async fn fetch_all(
        &self,
        collection: Collection,
        options: FetchOptions,
    ) -> Result<Vec<Value>, RemoteError> {
        let mut query = vec![("select".to_owned(), "*".to_owned())];
        if options.newest_first {
            query.push(("order".to_owned(), "created_at.desc".to_owned()));
        }
        if let Some(limit) = options.limit {
            query.push(("limit".to_owned(), limit.to_string()));
        }

        let request = self
            .inner
            .client
            .get(self.endpoint(collection))
            .query(&query);
        self.execute(collection, RemoteOp::FetchAll, request).await
    }

    #[instrument(skip(self), fields(collection = collection.name(), id = %id))]
    async fn fetch_one(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, RemoteError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .inner
            .client
            .get(self.endpoint(collection))
            .query(&[("select", "*"), ("id", id_filter.as_str())]);
        let rows = self.execute(collection, RemoteOp::FetchOne, request).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self), fields(collection = collection.name(), owner = %owner_key))]
    async fn fetch_by_owner(
        &self,
        collection: Collection,
        owner_key: &str,
    ) -> Result<Vec<Value>, RemoteError> {
        let op = RemoteOp::FetchByOwner;
        let Some(owner_field) = collection.owner_field() else {
            // Adapter misuse, not a remote fault; surfaces like any other
            // remote failure so the orchestrator falls back.
            return Err(RemoteError::new(
                collection.name(),
                op,
                RemoteErrorKind::Unavailable,
            ));
        };

        let owner_filter = format!("eq.{owner_key}");
        let request = self.inner.client.get(self.endpoint(collection)).query(&[
            ("select", "*"),
            (owner_field, owner_filter.as_str()),
            ("order", "created_at.desc"),
        ]);
        self.execute(collection, op, request).await
    }

    #[instrument(skip(self, record), fields(collection = collection.name()))]
    async fn insert(&self, collection: Collection, record: Value) -> Result<(), RemoteError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(collection))
            .json(&record);
        self.execute(collection, RemoteOp::Insert, request).await?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(collection = collection.name(), key = %key))]
    async fn upsert(
        &self,
        collection: Collection,
        key: &str,
        record: Value,
    ) -> Result<(), RemoteError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(collection))
            .query(&[("on_conflict", collection.conflict_target())])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&record);
        self.execute(collection, RemoteOp::Upsert, request).await?;
        Ok(())
    }

    #[instrument(skip(self, patch), fields(collection = collection.name(), id = %id))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<(), RemoteError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .inner
            .client
            .patch(self.endpoint(collection))
            .query(&[("id", id_filter.as_str())])
            .json(&patch);
        self.execute(collection, RemoteOp::Update, request).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(collection = collection.name(), id = %id))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), RemoteError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .inner
            .client
            .delete(self.endpoint(collection))
            .query(&[("id", id_filter.as_str())]);
        self.execute(collection, RemoteOp::Delete, request).await?;
        Ok(())
    }
}
