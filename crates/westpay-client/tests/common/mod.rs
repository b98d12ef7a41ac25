//! Shared fixtures for client integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use westpay_client::{AuthUser, BalanceView, ClientConfig, ClientContext};
use westpay_core::{Money, UserId, UserProfile};
use westpay_store::{MemoryStore, Store};

/// A context over an in-memory store, with the store kept for inspection.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub ctx: ClientContext,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_document(json!({}))
    }

    pub fn with_document(document: Value) -> Self {
        let store = Arc::new(MemoryStore::with_document(document));
        let ctx = ClientContext::new(Arc::clone(&store) as Arc<dyn Store>, ClientConfig::default());
        Self { store, ctx }
    }

    /// Create a profile and empty wallet for `uid`.
    pub async fn sign_up(&self, uid: &str, name: &str, email: &str) -> UserId {
        let uid = UserId::new(uid).unwrap();
        self.ctx
            .create_user_profile(&uid, &UserProfile::new(name, email))
            .await
            .unwrap();
        uid
    }

    /// Report a sign-in for `uid` from the auth service.
    pub async fn sign_in(&self, uid: &UserId, email: &str) {
        self.ctx
            .on_auth_state_changed(Some(&AuthUser::new(uid.clone(), email)))
            .await
            .unwrap();
    }

    /// Sign up and sign in with a starting balance.
    pub async fn funded_user(&self, uid: &str, balance: Money) -> UserId {
        let email = format!("{uid}@mail.in");
        let uid = self.sign_up(uid, "", &email).await;
        if balance.is_positive() {
            self.ctx
                .admin()
                .add_money(&uid, balance, Some("Opening balance"))
                .await
                .unwrap();
        }
        uid
    }
}

/// What a [`RecordingView`] was asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown {
    Loading,
    Balance(Money),
}

/// A balance view that records every update.
#[derive(Default)]
pub struct RecordingView {
    events: Mutex<Vec<Shown>>,
}

impl RecordingView {
    pub fn events(&self) -> Vec<Shown> {
        self.events.lock().unwrap().clone()
    }
}

impl BalanceView for RecordingView {
    fn show_loading(&self) {
        self.events.lock().unwrap().push(Shown::Loading);
    }

    fn show_balance(&self, balance: Money) {
        self.events.lock().unwrap().push(Shown::Balance(balance));
    }
}
