//! Integration tests for the wishlist and customer accessors, including the
//! current-user record that feeds actor resolution.

use chrono::Utc;

use blue_papaya_core::{
    CurrencyCode, Customer, CustomerId, Email, Price, ProductId, WishlistItem,
};
use blue_papaya_data::{Collection, CurrentUser};
use blue_papaya_integration_tests::{harness, harness_with_session, line};

fn item(id: &str) -> WishlistItem {
    WishlistItem {
        item_id: ProductId::new(id),
        display_name: format!("Product {id}"),
        image_ref: None,
        unit_price: Price::from_cents(1999, CurrencyCode::USD),
        added_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_wishlist_add_dedups_by_product() {
    let h = harness_with_session("actor-1");

    h.store.wishlist().add(item("A")).await.expect("add");
    let items = h.store.wishlist().add(item("A")).await.expect("add");
    assert_eq!(items.len(), 1);

    assert!(h
        .store
        .wishlist()
        .contains(&ProductId::new("A"))
        .await
        .expect("contains"));
    assert_eq!(h.backend.row_count(Collection::UserWishlists), 1);
}

#[tokio::test]
async fn test_wishlist_remove_and_offline_fallback() {
    let h = harness_with_session("actor-1");
    h.backend.set_failing(true);

    h.store.wishlist().add(item("A")).await.expect("add");
    h.store.wishlist().add(item("B")).await.expect("add");
    let items = h
        .store
        .wishlist()
        .remove(&ProductId::new("A"))
        .await
        .expect("remove");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().map(|i| i.item_id.clone()), Some(ProductId::new("B")));
    assert_eq!(h.backend.row_count(Collection::UserWishlists), 0);
}

#[tokio::test]
async fn test_current_user_feeds_actor_resolution() {
    let h = harness();

    // Anonymous: cart mutations never reach the remote.
    h.store.cart().add_line(line("A", 1)).await.expect("add");
    assert_eq!(h.backend.row_count(Collection::UserCarts), 0);

    // Sign-in persists the current user; the next mutation syncs under the
    // resolved key.
    h.store
        .customers()
        .set_current_user(&CurrentUser {
            id: Some(CustomerId::new("cust-7")),
            email: Email::parse("papaya@example.com").expect("email"),
            name: Some("Papaya".to_owned()),
        })
        .await
        .expect("set current user");

    assert_eq!(
        h.store.resolve_actor().await.map(|a| a.to_string()),
        Some("cust-7".to_owned())
    );

    h.store.cart().add_line(line("B", 1)).await.expect("add");
    assert_eq!(h.backend.row_count(Collection::UserCarts), 1);

    // Sign-out returns to anonymous, local-only operation.
    h.store
        .customers()
        .clear_current_user()
        .await
        .expect("clear");
    assert!(h.store.resolve_actor().await.is_none());
}

#[tokio::test]
async fn test_customer_upsert_round_trip() {
    let h = harness();

    let customer = Customer {
        id: CustomerId::new("cust-1"),
        email: Email::parse("a@example.com").expect("email"),
        name: "Ada".to_owned(),
        created_at: Utc::now(),
    };
    h.store.customers().upsert(&customer).await.expect("upsert");

    // Update in place: same id, new name.
    let renamed = Customer {
        name: "Ada L.".to_owned(),
        ..customer.clone()
    };
    h.store.customers().upsert(&renamed).await.expect("upsert");

    let customers = h.store.customers().get_all().await.expect("get");
    assert_eq!(customers.len(), 1);
    assert_eq!(customers.first().map(|c| c.name.clone()), Some("Ada L.".to_owned()));

    // Mirror serves the same list when the remote goes away.
    h.backend.set_failing(true);
    let cached = h.store.customers().get_all().await.expect("get");
    assert_eq!(cached, customers);
}
