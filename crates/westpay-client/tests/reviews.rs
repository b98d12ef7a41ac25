//! Review submission, staging across sign-in, and moderation.

mod common;

use common::TestHarness;
use serde_json::json;
use westpay_client::{ClientError, ReviewDraft, ReviewSubmission};
use westpay_core::{ProductId, Rating, ReviewAuthor, ReviewUpdate, WestpayError};

fn draft(product: ProductId, stars: i64, text: &str) -> ReviewDraft {
    ReviewDraft {
        product_id: product,
        rating: Rating::new(stars).unwrap(),
        review_text: text.to_string(),
        return_url: Some(format!("overview/product info/{product}.html")),
    }
}

// ============================================================================
// Customer submission
// ============================================================================

#[tokio::test]
async fn customer_review_waits_for_approval() {
    let harness = TestHarness::new();
    let uid = harness.sign_up("u1", "Asha Rao", "asha@mail.in").await;
    harness.sign_in(&uid, "asha@mail.in").await;
    let ctx = &harness.ctx;

    let ReviewSubmission::Submitted(id) = ctx
        .submit_review(draft(ProductId::LazyPay, 4, "Quick approval"))
        .await
        .unwrap()
    else {
        panic!("signed-in submission should be written");
    };

    assert!(ctx.product_reviews(ProductId::LazyPay).await.unwrap().is_empty());

    let pending = ctx.admin().reviews_for_product(ProductId::LazyPay).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(!pending[0].approved);
    assert_eq!(pending[0].submitted_by, ReviewAuthor::Customer);
    assert_eq!(pending[0].customer_name, "Asha Rao");
    assert_eq!(pending[0].user_id.as_ref(), Some(&uid));

    ctx.admin().approve_review(ProductId::LazyPay, &id).await.unwrap();
    let visible = ctx.product_reviews(ProductId::LazyPay).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id.as_ref(), Some(&id));
    assert_eq!(visible[0].product_id, Some(ProductId::LazyPay));
}

#[tokio::test]
async fn empty_review_text_is_rejected() {
    let harness = TestHarness::new();
    let err = harness
        .ctx
        .submit_review(draft(ProductId::Axio, 5, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Domain(WestpayError::MissingField("review"))));
    assert!(harness.ctx.pending_review().is_none());
}

#[tokio::test]
async fn signed_out_review_is_submitted_once_after_sign_in() {
    let harness = TestHarness::new();
    let ctx = &harness.ctx;

    let outcome = ctx
        .submit_review(draft(ProductId::ZestMoney, 3, "Decent"))
        .await
        .unwrap();
    assert_eq!(outcome, ReviewSubmission::LoginRequired);
    let staged = ctx.pending_review().unwrap();
    assert_eq!(staged.product_id, ProductId::ZestMoney);
    assert!(ctx.admin().all_reviews().await.unwrap().is_empty());

    let uid = harness.sign_up("u1", "", "ravi.k@mail.in").await;
    harness.sign_in(&uid, "ravi.k@mail.in").await;

    assert!(ctx.pending_review().is_none());
    let reviews = ctx.admin().all_reviews().await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id.as_ref(), Some(&staged.key));
    assert_eq!(reviews[0].customer_name, "ravi.k");

    // A later sign-in finds nothing staged.
    assert_eq!(ctx.flush_pending_review(&uid, "ravi.k").await.unwrap(), None);
    harness.sign_in(&uid, "ravi.k@mail.in").await;
    assert_eq!(ctx.admin().all_reviews().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_flush_keeps_review_staged() {
    let harness = TestHarness::new();
    let ctx = &harness.ctx;
    ctx.submit_review(draft(ProductId::Axio, 5, "Great")).await.unwrap();

    let uid = westpay_core::UserId::new("u1").unwrap();
    harness
        .store
        .fail_next(westpay_store::StoreError::Network("offline".into()))
        .await;
    assert!(ctx.flush_pending_review(&uid, "Asha").await.is_err());
    assert!(ctx.pending_review().is_some());

    assert!(ctx.flush_pending_review(&uid, "Asha").await.unwrap().is_some());
    assert_eq!(ctx.admin().all_reviews().await.unwrap().len(), 1);
}

// ============================================================================
// Ratings
// ============================================================================

#[tokio::test]
async fn average_counts_approved_reviews_only() {
    let harness = TestHarness::new();
    let admin = harness.ctx.admin();

    for stars in [5, 4, 3] {
        admin
            .add_review(ProductId::BajajCard, Rating::new(stars).unwrap(), "ok", None, None)
            .await
            .unwrap();
    }
    admin
        .add_review(ProductId::BajajCard, Rating::new(1).unwrap(), "hidden", None, Some(false))
        .await
        .unwrap();

    let summary = harness.ctx.average_rating(ProductId::BajajCard).await.unwrap();
    assert_eq!(summary.count, 3);
    assert!((summary.average - 4.0).abs() < f64::EPSILON);

    let empty = harness.ctx.average_rating(ProductId::Axio).await.unwrap();
    assert_eq!(empty.count, 0);
    assert!(empty.average.abs() < f64::EPSILON);
}

#[tokio::test]
async fn legacy_reviews_load_with_defaults() {
    let harness = TestHarness::with_document(json!({
        "productReviews": {
            "home-credit": { "reviews": {
                "r1": { "review": "Old one", "approved": true, "timestamp": 1000 }
            } },
            "retired-product": { "reviews": {
                "r2": { "review": "Gone", "approved": true, "timestamp": 2000 }
            } }
        }
    }));

    let reviews = harness.ctx.product_reviews(ProductId::HomeCredit).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rating, Rating::MAX);
    assert_eq!(reviews[0].customer_name, "Anonymous");

    let all = harness.ctx.admin().all_reviews().await.unwrap();
    assert_eq!(all.len(), 1);
}

// ============================================================================
// Moderation
// ============================================================================

#[tokio::test]
async fn admin_reviews_default_to_approved() {
    let harness = TestHarness::new();
    let admin = harness.ctx.admin();

    admin
        .add_review(ProductId::CreditCard, Rating::new(5).unwrap(), "Shown", Some("Meera".into()), None)
        .await
        .unwrap();
    admin
        .add_review(ProductId::CreditCard, Rating::new(2).unwrap(), "Held", None, Some(false))
        .await
        .unwrap();

    let visible = harness.ctx.product_reviews(ProductId::CreditCard).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].customer_name, "Meera");
    assert_eq!(visible[0].submitted_by, ReviewAuthor::Admin);
    assert_eq!(admin.reviews_for_product(ProductId::CreditCard).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_changes_only_given_fields_and_delete_removes() {
    let harness = TestHarness::new();
    let admin = harness.ctx.admin();
    let id = admin
        .add_review(ProductId::MobikwikZip, Rating::new(4).unwrap(), "Original", Some("Dev".into()), None)
        .await
        .unwrap();

    admin
        .update_review(
            ProductId::MobikwikZip,
            &id,
            &ReviewUpdate {
                review: Some("Edited".into()),
                ..ReviewUpdate::default()
            },
        )
        .await
        .unwrap();
    admin
        .update_review(ProductId::MobikwikZip, &id, &ReviewUpdate::default())
        .await
        .unwrap();

    let reviews = harness.ctx.product_reviews(ProductId::MobikwikZip).await.unwrap();
    assert_eq!(reviews[0].review, "Edited");
    assert_eq!(reviews[0].customer_name, "Dev");
    assert_eq!(reviews[0].rating, Rating::new(4).unwrap());

    admin.delete_review(ProductId::MobikwikZip, &id).await.unwrap();
    assert!(admin.all_reviews().await.unwrap().is_empty());
}
