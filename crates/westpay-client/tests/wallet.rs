//! Wallet balance, transactions and fund requests.

mod common;

use common::TestHarness;
use serde_json::{json, Map, Value};
use westpay_client::wallet::BalanceChange;
use westpay_client::ClientError;
use westpay_core::{Money, RequestStatus, TransactionKind, TransactionSource, WestpayError};
use westpay_store::{DbPath, StoreExt};

// ============================================================================
// Credit and debit
// ============================================================================

#[tokio::test]
async fn credit_and_debit_record_transactions() {
    let harness = TestHarness::new();
    let uid = harness.sign_up("u1", "Asha", "asha@mail.in").await;
    let ctx = &harness.ctx;

    let change = BalanceChange::from_source(TransactionSource::Other("upi".into()));
    assert_eq!(
        ctx.credit(&uid, Money::from_rupees(1000), change.clone()).await.unwrap(),
        Money::from_rupees(1000)
    );
    assert_eq!(
        ctx.debit(&uid, Money::from_paise(25_050), change).await.unwrap(),
        Money::from_paise(74_950)
    );
    assert_eq!(ctx.balance(&uid).await.unwrap(), Money::from_paise(74_950));

    let transactions = ctx.transactions(&uid, 10).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert!(transactions
        .iter()
        .any(|t| t.kind == TransactionKind::Withdraw && t.balance == Money::from_paise(74_950)));
    assert!(transactions.iter().all(|t| t.timestamp.millis() > 0));

    assert_eq!(ctx.transactions(&uid, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn overdraw_leaves_store_untouched() {
    let harness = TestHarness::new();
    let uid = harness.funded_user("u1", Money::from_rupees(100)).await;
    let before = harness.store.snapshot().await;

    let err = harness
        .ctx
        .debit(
            &uid,
            Money::from_rupees(250),
            BalanceChange::from_source(TransactionSource::AdminDebit),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Domain(WestpayError::InsufficientBalance { balance, required })
            if balance == Money::from_rupees(100) && required == Money::from_rupees(250)
    ));
    assert_eq!(harness.store.snapshot().await, before);
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let harness = TestHarness::new();
    let uid = harness.sign_up("u1", "Asha", "asha@mail.in").await;
    let change = BalanceChange::from_source(TransactionSource::AdminCredit);

    for amount in [Money::ZERO, Money::from_rupees(-5)] {
        let err = harness.ctx.credit(&uid, amount, change.clone()).await.unwrap_err();
        assert!(matches!(err, ClientError::Domain(WestpayError::InvalidAmount(_))));
    }
    assert!(harness.ctx.transactions(&uid, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_balance_reads_zero() {
    let harness = TestHarness::new();
    let uid = westpay_core::UserId::new("ghost").unwrap();
    assert_eq!(harness.ctx.balance(&uid).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn wallet_write_drops_cached_balance() {
    let harness = TestHarness::new();
    let uid = harness.funded_user("u1", Money::from_rupees(10)).await;
    let loader = harness.ctx.balance_loader();

    loader.load(&uid, &westpay_client::NoView).await;
    assert_eq!(loader.cached(&uid), Some(Money::from_rupees(10)));

    harness
        .ctx
        .admin()
        .add_money(&uid, Money::from_rupees(5), None)
        .await
        .unwrap();
    assert_eq!(loader.cached(&uid), None);
}

// ============================================================================
// Fund requests
// ============================================================================

#[tokio::test]
async fn payment_request_starts_pending_and_keeps_details() {
    let harness = TestHarness::new();
    let uid = harness.sign_up("u1", "Asha", "asha@mail.in").await;

    let mut details = Map::new();
    details.insert("utrNumber".into(), json!("UTR123"));
    details.insert("status".into(), json!("approved"));
    let id = harness
        .ctx
        .add_payment_request(&uid, Money::from_rupees(500), details)
        .await
        .unwrap();

    let stored: Value = harness
        .store
        .get_as(&DbPath::payment_request(&uid, &id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["status"], RequestStatus::Pending.as_str());
    assert_eq!(stored["amount"], 500);
    assert_eq!(stored["utrNumber"], "UTR123");
    assert!(stored["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn withdrawal_request_needs_positive_amount() {
    let harness = TestHarness::new();
    let uid = harness.sign_up("u1", "Asha", "asha@mail.in").await;

    let err = harness
        .ctx
        .add_withdrawal_request(&uid, Money::ZERO, Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Domain(WestpayError::InvalidAmount(_))));
}
