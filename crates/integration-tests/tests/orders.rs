//! Integration tests for orders: creation events, the order notification,
//! status transitions, and read fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use blue_papaya_core::{CurrencyCode, Email, NotificationKind, OrderStatus, Price};
use blue_papaya_data::{Collection, StoreEvent};
use blue_papaya_integration_tests::{harness, line};

fn email(s: &str) -> Email {
    Email::parse(s).expect("valid email")
}

#[tokio::test]
async fn test_create_order_fires_events_and_notification() {
    let h = harness();

    let new_orders = Arc::new(AtomicUsize::new(0));
    let new_notifications = Arc::new(AtomicUsize::new(0));
    let orders_counter = Arc::clone(&new_orders);
    let notifications_counter = Arc::clone(&new_notifications);
    h.store.events().subscribe(move |event| match event {
        StoreEvent::NewOrder { .. } => {
            orders_counter.fetch_add(1, Ordering::SeqCst);
        }
        StoreEvent::NewNotification { .. } => {
            notifications_counter.fetch_add(1, Ordering::SeqCst);
        }
        _ => {}
    });

    let order = h
        .store
        .orders()
        .create(
            email("shopper@example.com"),
            vec![line("A", 2)],
            Price::from_cents(3998, CurrencyCode::USD),
        )
        .await
        .expect("create order");

    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(new_orders.load(Ordering::SeqCst), 1);
    assert_eq!(new_notifications.load(Ordering::SeqCst), 1);
    assert_eq!(h.backend.row_count(Collection::Orders), 1);

    let notifications = h.store.notifications().get_all().await.expect("get");
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications.first().map(|n| n.kind),
        Some(NotificationKind::Order)
    );
}

#[tokio::test]
async fn test_status_transition_is_the_only_mutation() {
    let h = harness();

    let order = h
        .store
        .orders()
        .create(
            email("shopper@example.com"),
            vec![line("A", 1)],
            Price::from_cents(1999, CurrencyCode::USD),
        )
        .await
        .expect("create order");

    h.store
        .orders()
        .update_status(&order.id, OrderStatus::Shipped)
        .await
        .expect("update status");

    let orders = h.store.orders().get_all().await.expect("get");
    let stored = orders
        .iter()
        .find(|o| o.id == order.id)
        .expect("order present");
    assert_eq!(stored.status, OrderStatus::Shipped);
    // Everything but the status is frozen at creation.
    assert_eq!(stored.lines, order.lines);
    assert_eq!(stored.total, order.total);
    assert_eq!(stored.created_at, order.created_at);
}

#[tokio::test]
async fn test_get_for_filters_by_owner() {
    let h = harness();
    let total = Price::from_cents(1999, CurrencyCode::USD);

    h.store
        .orders()
        .create(email("a@example.com"), vec![line("A", 1)], total)
        .await
        .expect("create");
    h.store
        .orders()
        .create(email("b@example.com"), vec![line("B", 1)], total)
        .await
        .expect("create");

    let mine = h
        .store
        .orders()
        .get_for(&email("a@example.com"))
        .await
        .expect("get_for");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine.first().map(|o| o.owner_email.as_str()), Some("a@example.com"));
}

#[tokio::test]
async fn test_orders_read_falls_back_to_mirror() {
    let h = harness();

    h.store
        .orders()
        .create(
            email("shopper@example.com"),
            vec![line("A", 1)],
            Price::from_cents(1999, CurrencyCode::USD),
        )
        .await
        .expect("create");

    // Refresh the mirror, then lose the remote.
    let before = h.store.orders().get_all().await.expect("get");
    h.backend.set_failing(true);
    let after = h.store.orders().get_all().await.expect("get");
    assert_eq!(before, after);

    let for_owner = h
        .store
        .orders()
        .get_for(&email("shopper@example.com"))
        .await
        .expect("get_for");
    assert_eq!(for_owner.len(), 1);
}
