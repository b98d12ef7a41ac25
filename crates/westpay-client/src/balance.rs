//! Wallet balance loading with a short-lived local cache.
//!
//! A load shows a fresh cached balance right away, then fetches the real one
//! from the store. Loads for the same user that overlap share one store read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use westpay_core::{now_millis, Money, UserId};
use westpay_store::{DbPath, Store, StoreError, StoreExt};

use crate::storage::KeyValueStorage;

/// Where a balance is displayed.
pub trait BalanceView: Send + Sync {
    /// A load has started.
    fn show_loading(&self);

    /// Show `balance`.
    fn show_balance(&self, balance: Money);
}

/// A view that displays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoView;

impl BalanceView for NoView {
    fn show_loading(&self) {}
    fn show_balance(&self, _balance: Money) {}
}

type LoadFuture = Shared<BoxFuture<'static, Result<Money, StoreError>>>;

#[derive(Clone)]
struct InFlight {
    user_id: UserId,
    generation: u64,
    load: LoadFuture,
}

/// Loads wallet balances, deduplicating concurrent reads.
pub struct BalanceLoader {
    store: Arc<dyn Store>,
    cache: Arc<dyn KeyValueStorage>,
    ttl: Duration,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: AtomicU64,
}

impl std::fmt::Debug for BalanceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceLoader")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Local storage key of a user's cached balance.
#[must_use]
pub fn cache_key(user_id: &UserId) -> String {
    format!("walletBalance_{user_id}")
}

/// Local storage key of the time a user's balance was cached.
#[must_use]
pub fn cache_time_key(user_id: &UserId) -> String {
    format!("walletBalance_time_{user_id}")
}

impl BalanceLoader {
    /// Create a loader reading from `store` and caching in `cache`.
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn KeyValueStorage>, ttl: Duration) -> Self {
        Self {
            store,
            cache,
            ttl,
            in_flight: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// The cached balance, if younger than the freshness window.
    #[must_use]
    pub fn cached(&self, user_id: &UserId) -> Option<Money> {
        let value = self.cache.get(&cache_key(user_id))?;
        let cached_at: i64 = self.cache.get(&cache_time_key(user_id))?.parse().ok()?;

        let age = u128::try_from(now_millis().saturating_sub(cached_at)).ok()?;
        if age >= self.ttl.as_millis() {
            return None;
        }
        value.parse().ok()
    }

    fn store_cache(&self, user_id: &UserId, balance: Money) {
        self.cache.set(&cache_key(user_id), balance.to_string());
        self.cache.set(&cache_time_key(user_id), now_millis().to_string());
    }

    /// Forget the cached balance, after a local write changed it.
    pub fn invalidate(&self, user_id: &UserId) {
        self.cache.remove(&cache_key(user_id));
        self.cache.remove(&cache_time_key(user_id));
    }

    /// Whether a load is in flight for any user.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The in-flight load for `user_id`, starting one if there is none.
    fn join_or_start(&self, user_id: &UserId) -> LoadFuture {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = slot.as_ref().filter(|f| &f.user_id == user_id) {
            tracing::debug!(user_id = %user_id, "Joining in-flight balance load");
            return current.load.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let store = Arc::clone(&self.store);
        let marker = Arc::clone(&self.in_flight);
        let uid = user_id.clone();

        let load = async move {
            let result = store
                .get_as::<Money>(&DbPath::balance(&uid))
                .await
                .map(Option::unwrap_or_default);

            let mut slot = marker.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|f| f.generation == generation) {
                *slot = None;
            }
            result
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            user_id: user_id.clone(),
            generation,
            load: load.clone(),
        });
        load
    }

    /// Load `user_id`'s balance into `view`.
    ///
    /// Shows a loading state, then any fresh cached balance, then the stored
    /// balance. On failure the view shows zero and zero is returned; failed
    /// loads are not cached.
    pub async fn load(&self, user_id: &UserId, view: &dyn BalanceView) -> Money {
        view.show_loading();

        if let Some(cached) = self.cached(user_id) {
            tracing::debug!(user_id = %user_id, balance = %cached, "Showing cached balance");
            view.show_balance(cached);
        }

        match self.join_or_start(user_id).await {
            Ok(balance) => {
                view.show_balance(balance);
                self.store_cache(user_id, balance);
                balance
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Error loading wallet balance");
                view.show_balance(Money::ZERO);
                Money::ZERO
            }
        }
    }

    /// Start loading `user_id`'s balance in the background; a later
    /// [`load`](Self::load) joins it. Does nothing outside a Tokio runtime
    /// except register the load for the next caller to drive.
    pub fn preload(&self, user_id: &UserId) {
        tracing::debug!(user_id = %user_id, "Preloading wallet balance");
        let load = self.join_or_start(user_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = load.await {
                    tracing::warn!(error = %e, "Preload error");
                }
            });
        }
    }
}
