//! Balance loading: cache, in-flight sharing and failure handling.

mod common;

use std::time::Duration;

use common::{RecordingView, Shown, TestHarness};
use serde_json::json;
use westpay_client::balance::{cache_key, cache_time_key};
use westpay_core::{now_millis, Money, UserId};
use westpay_store::StoreError;

fn harness_with_balance(rupees: i64) -> (TestHarness, UserId) {
    let harness = TestHarness::with_document(json!({
        "users": { "u1": { "wallet": { "balance": rupees } } }
    }));
    (harness, UserId::new("u1").unwrap())
}

fn seed_cache(harness: &TestHarness, uid: &UserId, value: &str, age_ms: i64) {
    let local = harness.ctx.local_storage();
    local.set(&cache_key(uid), value.to_string());
    local.set(&cache_time_key(uid), (now_millis() - age_ms).to_string());
}

#[tokio::test(start_paused = true)]
async fn fresh_cache_shows_before_remote_value() {
    let (harness, uid) = harness_with_balance(300);
    seed_cache(&harness, &uid, "250.00", 1_000);
    harness.store.set_latency(Duration::from_millis(200)).await;

    let view = RecordingView::default();
    let balance = harness.ctx.balance_loader().load(&uid, &view).await;

    assert_eq!(balance, Money::from_rupees(300));
    assert_eq!(
        view.events(),
        vec![
            Shown::Loading,
            Shown::Balance(Money::from_rupees(250)),
            Shown::Balance(Money::from_rupees(300)),
        ]
    );
    assert_eq!(
        harness.ctx.balance_loader().cached(&uid),
        Some(Money::from_rupees(300))
    );
}

#[tokio::test]
async fn stale_cache_is_not_shown() {
    let (harness, uid) = harness_with_balance(300);
    seed_cache(&harness, &uid, "250.00", 60_000);

    let view = RecordingView::default();
    harness.ctx.balance_loader().load(&uid, &view).await;

    assert_eq!(
        view.events(),
        vec![Shown::Loading, Shown::Balance(Money::from_rupees(300))]
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_loads_share_one_read() {
    let (harness, uid) = harness_with_balance(42);
    harness.store.set_latency(Duration::from_millis(100)).await;
    let loader = harness.ctx.balance_loader();

    let (a, b) = (RecordingView::default(), RecordingView::default());
    let (first, second) = tokio::join!(loader.load(&uid, &a), loader.load(&uid, &b));

    assert_eq!(first, Money::from_rupees(42));
    assert_eq!(second, Money::from_rupees(42));
    assert_eq!(harness.store.reads(), 1);
    assert_eq!(a.events().last(), Some(&Shown::Balance(Money::from_rupees(42))));
    assert_eq!(b.events().last(), Some(&Shown::Balance(Money::from_rupees(42))));
    assert!(!loader.is_loading());
}

#[tokio::test]
async fn sequential_loads_read_again() {
    let (harness, uid) = harness_with_balance(42);
    let loader = harness.ctx.balance_loader();

    loader.load(&uid, &westpay_client::NoView).await;
    loader.load(&uid, &westpay_client::NoView).await;
    assert_eq!(harness.store.reads(), 2);
}

#[tokio::test]
async fn failed_load_shows_zero_and_is_not_cached() {
    let (harness, uid) = harness_with_balance(42);
    harness
        .store
        .fail_next(StoreError::Network("connection reset".into()))
        .await;
    let loader = harness.ctx.balance_loader();

    let view = RecordingView::default();
    assert_eq!(loader.load(&uid, &view).await, Money::ZERO);
    assert_eq!(view.events(), vec![Shown::Loading, Shown::Balance(Money::ZERO)]);
    assert_eq!(loader.cached(&uid), None);
    assert!(!loader.is_loading());

    // The next call starts a new load.
    assert_eq!(loader.load(&uid, &view).await, Money::from_rupees(42));
}

#[tokio::test(start_paused = true)]
async fn preload_is_joined_by_load() {
    let (harness, uid) = harness_with_balance(7);
    harness.store.set_latency(Duration::from_millis(50)).await;
    let loader = harness.ctx.balance_loader();

    loader.preload(&uid);
    assert!(loader.is_loading());
    assert_eq!(loader.load(&uid, &westpay_client::NoView).await, Money::from_rupees(7));
    assert_eq!(harness.store.reads(), 1);
}

#[tokio::test]
async fn quick_setup_loads_signed_in_user() {
    let harness = TestHarness::new();
    let uid = harness.funded_user("u1", Money::from_rupees(900)).await;
    harness.sign_in(&uid, "u1@mail.in").await;

    let view = RecordingView::default();
    assert_eq!(harness.ctx.quick_setup(&view).await, Some(Money::from_rupees(900)));
    assert_eq!(view.events().first(), Some(&Shown::Loading));
}
