//! Blob storage gateway collaborator.
//!
//! Image transcoding and signed-URL issuance live outside this crate; the
//! data layer only consumes them through [`BlobGateway`] and memoizes the
//! issued URLs, keyed by `bucket/path`, so repeated renders of the same
//! image do not round-trip to the gateway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use url::Url;

/// Error from the blob storage collaborator.
#[derive(Debug, Clone, thiserror::Error)]
#[error("blob gateway: {0}")]
pub struct BlobError(pub String);

/// Signed-URL issuance for stored objects. Implemented by the storage
/// collaborator; out of scope here beyond this contract.
#[async_trait]
pub trait BlobGateway: Send + Sync {
    /// Issue a signed URL for the object at `bucket/path`.
    async fn signed_url(&self, bucket: &str, path: &str) -> Result<Url, BlobError>;

    /// Issue a signed URL for a `width`-pixel thumbnail of the object.
    ///
    /// Gateways without a transcoding pipeline serve the original.
    async fn thumbnail_url(&self, bucket: &str, path: &str, width: u32) -> Result<Url, BlobError> {
        let _ = width;
        self.signed_url(bucket, path).await
    }
}

/// Signed URLs expire server-side; keep cached copies well inside that
/// window.
const URL_TTL: Duration = Duration::from_secs(45 * 60);
const CACHE_CAPACITY: u64 = 2_000;

/// Memoizing layer over a [`BlobGateway`].
#[derive(Clone)]
pub struct SignedUrlCache {
    inner: Arc<SignedUrlCacheInner>,
}

struct SignedUrlCacheInner {
    gateway: Arc<dyn BlobGateway>,
    urls: Cache<String, Url>,
    thumbnails: Cache<String, Url>,
}

impl SignedUrlCache {
    /// Wrap a gateway with the default TTL.
    #[must_use]
    pub fn new(gateway: Arc<dyn BlobGateway>) -> Self {
        let build = || {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(URL_TTL)
                .build()
        };
        Self {
            inner: Arc::new(SignedUrlCacheInner {
                gateway,
                urls: build(),
                thumbnails: build(),
            }),
        }
    }

    /// Signed URL for `bucket/path`, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] if the gateway cannot issue a URL.
    pub async fn signed_url(&self, bucket: &str, path: &str) -> Result<Url, BlobError> {
        let key = format!("{bucket}/{path}");
        let gateway = Arc::clone(&self.inner.gateway);
        let (bucket, path) = (bucket.to_owned(), path.to_owned());
        self.inner
            .urls
            .try_get_with(key, async move { gateway.signed_url(&bucket, &path).await })
            .await
            .map_err(|e: Arc<BlobError>| (*e).clone())
    }

    /// Thumbnail URL for `bucket/path` at `width` pixels, from cache when
    /// fresh.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] if the gateway cannot issue a URL.
    pub async fn thumbnail_url(
        &self,
        bucket: &str,
        path: &str,
        width: u32,
    ) -> Result<Url, BlobError> {
        let key = format!("{bucket}/{path}@{width}");
        let gateway = Arc::clone(&self.inner.gateway);
        let (bucket, path) = (bucket.to_owned(), path.to_owned());
        self.inner
            .thumbnails
            .try_get_with(key, async move {
                gateway.thumbnail_url(&bucket, &path, width).await
            })
            .await
            .map_err(|e: Arc<BlobError>| (*e).clone())
    }
}
