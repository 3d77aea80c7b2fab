//! Integration tests for the cart accessor.
//!
//! End-to-end over the real accessor → fallback → cache → event path, with
//! the in-memory remote standing in for the managed database.

use blue_papaya_core::VariantSpec;
use blue_papaya_data::{Collection, RemoteBackend, StoreEvent};
use blue_papaya_integration_tests::{harness, harness_with_session, line, line_with_variant};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Merge semantics
// ============================================================================

#[tokio::test]
async fn test_duplicate_add_merges_into_one_line() {
    let h = harness_with_session("actor-1");

    h.store.cart().add_line(line("A", 1)).await.expect("add");
    let cart = h.store.cart().add_line(line("A", 2)).await.expect("add");

    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines.first().map(|l| l.quantity), Some(3));
    // One remote row per actor, not one per add.
    assert_eq!(h.backend.row_count(Collection::UserCarts), 1);
}

#[tokio::test]
async fn test_variants_keep_separate_lines() {
    let h = harness_with_session("actor-1");

    h.store.cart().add_line(line("A", 1)).await.expect("add");
    let cart = h
        .store
        .cart()
        .add_line(line_with_variant("A", 1, VariantSpec::new().with("size", "M")))
        .await
        .expect("add");

    assert_eq!(cart.lines.len(), 2);
}

#[tokio::test]
async fn test_quantity_floor_clamps_at_one() {
    let h = harness_with_session("actor-1");

    h.store.cart().add_line(line("A", 2)).await.expect("add");
    let cart = h
        .store
        .cart()
        .adjust_quantity(0, -5)
        .await
        .expect("adjust");

    assert_eq!(cart.lines.first().map(|l| l.quantity), Some(1));
}

// ============================================================================
// Fallback policy
// ============================================================================

#[tokio::test]
async fn test_fallback_transparency_with_remote_down() {
    let h = harness_with_session("actor-1");
    h.backend.set_failing(true);

    let cart = h.store.cart().add_line(line("A", 1)).await.expect("add");
    assert_eq!(cart.total_quantity(), 1);

    let cart = h.store.cart().get().await.expect("get");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(h.backend.row_count(Collection::UserCarts), 0);
}

#[tokio::test]
async fn test_empty_remote_cart_does_not_clobber_local() {
    let h = harness_with_session("actor-1");

    // A non-empty cart exists locally only (remote was down at add time).
    h.backend.set_failing(true);
    h.store.cart().add_line(line("A", 1)).await.expect("add");
    h.backend.set_failing(false);

    // The remote comes back with a stale empty snapshot for this actor.
    h.backend
        .upsert(
            Collection::UserCarts,
            "actor-1",
            serde_json::json!({
                "owner_key": "actor-1",
                "items": [],
                "updated_at": "2026-01-01T00:00:00Z"
            }),
        )
        .await
        .expect("seed remote");

    let cart = h.store.cart().get().await.expect("get");
    assert_eq!(cart.lines.len(), 1);
}

#[tokio::test]
async fn test_anonymous_cart_never_touches_remote() {
    let h = harness();

    let cart = h.store.cart().add_line(line("A", 1)).await.expect("add");
    assert_eq!(cart.total_quantity(), 1);
    assert_eq!(h.backend.row_count(Collection::UserCarts), 0);

    let cart = h.store.cart().get().await.expect("get");
    assert_eq!(cart.lines.len(), 1);
}

#[tokio::test]
async fn test_remote_write_through_is_visible_cache_only() {
    let h = harness_with_session("actor-1");

    h.store.cart().add_line(line("A", 2)).await.expect("add");
    assert_eq!(h.backend.row_count(Collection::UserCarts), 1);

    // Take the remote away: the mirror alone must serve the same cart.
    h.backend.set_failing(true);
    let cart = h.store.cart().get().await.expect("get");
    assert_eq!(cart.total_quantity(), 2);
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[tokio::test]
async fn test_cart_lifecycle_scenario() {
    let h = harness_with_session("actor-1");
    let cart_store = h.store.cart();

    cart_store.add_line(line("A", 1)).await.expect("add");
    let cart = cart_store
        .add_line(line_with_variant("A", 2, VariantSpec::new()))
        .await
        .expect("add");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines.first().map(|l| l.quantity), Some(3));

    let cart = cart_store.remove_line(0).await.expect("remove");
    assert!(cart.is_empty());
    assert_eq!(cart_store.total_quantity().await.expect("total"), 0);
}

// ============================================================================
// Events & cancellation
// ============================================================================

#[tokio::test]
async fn test_cart_mutations_emit_cart_updated() {
    let h = harness_with_session("actor-1");

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    h.store.events().subscribe(move |event| {
        if *event == StoreEvent::CartUpdated {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    h.store.cart().add_line(line("A", 1)).await.expect("add");
    h.store.cart().adjust_quantity(0, 1).await.expect("adjust");
    h.store.cart().remove_line(0).await.expect("remove");

    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_aborted_operation_commits_nothing() {
    let h = harness_with_session("actor-1");
    h.store.cart().add_line(line("A", 1)).await.expect("add");

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    h.store.events().subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let token = CancellationToken::new();
    token.cancel();
    let aborted = h.store.with_abort(token);
    let result = aborted.cart().add_line(line("B", 1)).await;
    assert!(matches!(result, Err(blue_papaya_data::DataError::Aborted)));

    // The untouched handle still sees the original single-line cart and no
    // events were emitted by the aborted call.
    let cart = h.store.cart().get().await.expect("get");
    assert_eq!(cart.total_quantity(), 1);
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}
