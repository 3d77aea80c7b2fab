//! Error types for the data layer.
//!
//! The taxonomy follows the recovery policy, not the failure site:
//! - [`RemoteError`] - a remote round trip failed; recovered by falling back
//!   to the local cache and never surfaced to accessor callers.
//! - [`CacheError`] - the on-device cache itself failed; there is nothing
//!   left to fall back to, so this one does surface.
//! - [`DataError`] - the unified error accessor callers see.

use thiserror::Error;

/// The remote operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    FetchAll,
    FetchOne,
    FetchByOwner,
    Insert,
    Upsert,
    Update,
    Delete,
}

impl RemoteOp {
    /// Operation name for error messages and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FetchAll => "fetch_all",
            Self::FetchOne => "fetch_one",
            Self::FetchByOwner => "fetch_by_owner",
            Self::Insert => "insert",
            Self::Upsert => "upsert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl core::fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote store operation, carrying the collection name, the
/// operation, and the underlying cause.
#[derive(Debug, Error)]
#[error("remote {op} on {collection}: {kind}")]
pub struct RemoteError {
    /// Remote collection the operation targeted.
    pub collection: &'static str,
    /// The operation that failed.
    pub op: RemoteOp,
    /// Underlying cause.
    #[source]
    pub kind: RemoteErrorKind,
}

impl RemoteError {
    /// Create a remote error for the given collection and operation.
    #[must_use]
    pub const fn new(collection: &'static str, op: RemoteOp, kind: RemoteErrorKind) -> Self {
        Self {
            collection,
            op,
            kind,
        }
    }
}

/// Underlying cause of a [`RemoteError`].
#[derive(Debug, Error)]
pub enum RemoteErrorKind {
    /// HTTP transport failed before a response was received.
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote returned a non-success status.
    #[error("status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for diagnostics.
        body: String,
    },

    /// The response body could not be decoded into the expected record type.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend is switched off or unreachable by construction
    /// (e.g. an in-memory backend in failing mode).
    #[error("backend unavailable")]
    Unavailable,
}

/// A failed local cache operation.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache io: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file or a cached entry could not be (de)serialized.
    #[error("cache decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Unified error type surfaced by the public accessors.
///
/// Accessors never return remote failures: the fallback orchestrator
/// recovers them via the local cache and logs instead. The
/// [`DataError::Remote`] variant exists for embedders composing
/// [`crate::remote::RemoteStore`] directly.
#[derive(Debug, Error)]
pub enum DataError {
    /// Local cache failed; no further fallback exists.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A directly-invoked remote operation failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation was aborted via its cancellation token before results
    /// were committed. Caches and observers were left untouched.
    #[error("operation aborted")]
    Aborted,
}

/// Result type alias for accessor operations.
pub type Result<T> = std::result::Result<T, DataError>;
