//! Integration tests for reviews and the derived product rating.

use rust_decimal::Decimal;

use blue_papaya_core::{ProductId, Rating, ReviewStatus};
use blue_papaya_data::Collection;
use blue_papaya_integration_tests::{harness, harness_with_session, product};

fn rating(value: u8) -> Rating {
    Rating::new(value).expect("valid rating")
}

#[tokio::test]
async fn test_approval_recomputes_product_aggregate() {
    let h = harness();
    let id = ProductId::new("P");
    h.store.products().upsert(&product("P")).await.expect("seed");

    let r4 = h
        .store
        .reviews()
        .submit(id.clone(), rating(4), "Good")
        .await
        .expect("submit");
    let r5 = h
        .store
        .reviews()
        .submit(id.clone(), rating(5), "Great")
        .await
        .expect("submit");

    // Pending reviews do not contribute.
    let stored = h.store.products().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.reviews_count, 0);

    h.store
        .reviews()
        .set_status(&r4.id, ReviewStatus::Approved)
        .await
        .expect("approve");
    h.store
        .reviews()
        .set_status(&r5.id, ReviewStatus::Approved)
        .await
        .expect("approve");

    let stored = h.store.products().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.reviews_count, 2);
    assert_eq!(stored.rating, Decimal::new(45, 1));
}

#[tokio::test]
async fn test_rejection_excludes_from_aggregate() {
    let h = harness();
    let id = ProductId::new("P");
    h.store.products().upsert(&product("P")).await.expect("seed");

    let r2 = h
        .store
        .reviews()
        .submit(id.clone(), rating(2), "Meh")
        .await
        .expect("submit");
    let r5 = h
        .store
        .reviews()
        .submit(id.clone(), rating(5), "Great")
        .await
        .expect("submit");

    h.store
        .reviews()
        .set_status(&r2.id, ReviewStatus::Approved)
        .await
        .expect("approve");
    h.store
        .reviews()
        .set_status(&r5.id, ReviewStatus::Approved)
        .await
        .expect("approve");
    h.store
        .reviews()
        .set_status(&r2.id, ReviewStatus::Rejected)
        .await
        .expect("reject");

    let stored = h.store.products().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.reviews_count, 1);
    assert_eq!(stored.rating, Decimal::from(5));
}

#[tokio::test]
async fn test_mean_rounds_to_two_places() {
    let h = harness();
    let id = ProductId::new("P");
    h.store.products().upsert(&product("P")).await.expect("seed");

    for value in [4, 4, 5] {
        let review = h
            .store
            .reviews()
            .submit(id.clone(), rating(value), "r")
            .await
            .expect("submit");
        h.store
            .reviews()
            .set_status(&review.id, ReviewStatus::Approved)
            .await
            .expect("approve");
    }

    let stored = h.store.products().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.rating, Decimal::new(433, 2));
}

#[tokio::test]
async fn test_delete_recomputes_aggregate() {
    let h = harness();
    let id = ProductId::new("P");
    h.store.products().upsert(&product("P")).await.expect("seed");

    let review = h
        .store
        .reviews()
        .submit(id.clone(), rating(3), "Fine")
        .await
        .expect("submit");
    h.store
        .reviews()
        .set_status(&review.id, ReviewStatus::Approved)
        .await
        .expect("approve");
    h.store.reviews().delete(&review.id).await.expect("delete");

    let stored = h.store.products().get(&id).await.expect("get").expect("present");
    assert_eq!(stored.reviews_count, 0);
    assert_eq!(stored.rating, Decimal::ZERO);
}

#[tokio::test]
async fn test_signed_in_submission_carries_author() {
    let h = harness_with_session("reviewer-1");
    h.store.products().upsert(&product("P")).await.expect("seed");

    let review = h
        .store
        .reviews()
        .submit(ProductId::new("P"), rating(5), "Great")
        .await
        .expect("submit");

    assert_eq!(review.author.as_ref().map(ToString::to_string), Some("reviewer-1".to_owned()));
    assert_eq!(h.backend.row_count(Collection::ProductReviews), 1);

    let listed = h
        .store
        .reviews()
        .get_for_product(&ProductId::new("P"))
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
}
