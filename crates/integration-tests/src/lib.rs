//! Shared fixtures for Blue Papaya integration tests.
//!
//! Scenarios run hermetically: the store is wired over a [`MemoryBackend`]
//! and a throwaway profile directory, so tests exercise the full accessor →
//! fallback → cache → event path without a network or a shared database.
//! Flip the backend into failing mode to simulate remote outage.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use blue_papaya_core::{
    ActorKey, CartLine, CurrencyCode, Price, Product, ProductId, VariantSpec,
};
use blue_papaya_data::{DataConfig, MemoryBackend, SessionProvider, Store};

/// A store wired over an in-memory remote and a throwaway profile.
///
/// Keep the harness alive for the duration of the test: dropping it
/// deletes the profile directory.
pub struct Harness {
    /// Owns the profile directory.
    _profile: TempDir,
    /// The in-memory remote; use [`MemoryBackend::set_failing`] to take it
    /// offline.
    pub backend: MemoryBackend,
    /// The store under test.
    pub store: Store,
}

/// Session collaborator that always reports the same signed-in subject.
struct FixedSession(ActorKey);

#[async_trait]
impl SessionProvider for FixedSession {
    async fn current_subject(&self) -> Option<ActorKey> {
        Some(self.0.clone())
    }
}

/// Build a harness with no active session (actor resolves from the cached
/// current user, if any).
#[must_use]
pub fn harness() -> Harness {
    build(None)
}

/// Build a harness with a signed-in session subject.
#[must_use]
pub fn harness_with_session(subject: &str) -> Harness {
    build(Some(Arc::new(FixedSession(ActorKey::new(subject)))))
}

fn build(session: Option<Arc<dyn SessionProvider>>) -> Harness {
    // Honor RUST_LOG when a test run wants fallback/remote tracing; only the
    // first harness in the process installs the subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let profile = tempfile::tempdir().expect("create profile dir");
    let config = DataConfig::new("https://remote.invalid", "test-key", profile.path())
        .expect("test config")
        .with_notify_poll(std::time::Duration::from_millis(40));
    let backend = MemoryBackend::new();
    let store = Store::with_parts(&config, Arc::new(backend.clone()), session);
    Harness {
        _profile: profile,
        backend,
        store,
    }
}

/// A cart line for product `id` with the given quantity and no options.
#[must_use]
pub fn line(id: &str, quantity: u32) -> CartLine {
    line_with_variant(id, quantity, VariantSpec::new())
}

/// A cart line for product `id` with the given quantity and options.
#[must_use]
pub fn line_with_variant(id: &str, quantity: u32, variant: VariantSpec) -> CartLine {
    CartLine {
        item_id: ProductId::new(id),
        display_name: format!("Product {id}"),
        brand: "Blue Papaya".to_owned(),
        image_ref: None,
        unit_price: Price::from_cents(1999, CurrencyCode::USD),
        quantity,
        variant,
    }
}

/// A catalog product with zeroed rating state.
#[must_use]
pub fn product(id: &str) -> Product {
    Product {
        id: ProductId::new(id),
        display_name: format!("Product {id}"),
        brand: "Blue Papaya".to_owned(),
        description: String::new(),
        image_ref: None,
        unit_price: Price::from_cents(1999, CurrencyCode::USD),
        rating: rust_decimal::Decimal::ZERO,
        reviews_count: 0,
        created_at: Utc::now(),
    }
}
