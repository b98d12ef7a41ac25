//! The client context: everything an operation needs, constructed once.

use std::sync::Arc;

use westpay_store::{RestOptions, RestStore, Store};

use crate::admin::AdminConsole;
use crate::balance::{BalanceLoader, BalanceView};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use westpay_core::Money;

/// Owns the store handle, local and session storage, configuration, retry
/// policy and balance loader.
pub struct ClientContext {
    store: Arc<dyn Store>,
    local: Arc<dyn KeyValueStorage>,
    session: Arc<dyn KeyValueStorage>,
    config: ClientConfig,
    retry: RetryPolicy,
    balance: BalanceLoader,
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("config", &self.config)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ClientContext {
    /// Create a context over `store` with in-memory local and session storage.
    pub fn new(store: Arc<dyn Store>, config: ClientConfig) -> Self {
        let local: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let balance = BalanceLoader::new(
            Arc::clone(&store),
            Arc::clone(&local),
            config.balance_cache_ttl(),
        );

        Self {
            store,
            local,
            session: Arc::new(MemoryStorage::new()),
            retry: config.retry_policy(),
            config,
            balance,
        }
    }

    /// Create a context talking to the hosted store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the local
    /// storage file cannot be opened.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        if config.database_url.trim().is_empty() {
            return Err(ClientError::Configuration("database URL is empty".into()));
        }

        let options = RestOptions {
            timeout_seconds: config.request_timeout_seconds,
            auth_token: config.auth_token.clone(),
        };
        let store = RestStore::with_options(&config.database_url, options)?;
        tracing::info!(database_url = %config.database_url, "Connected to hosted store");

        let local_path = config.local_storage_path.clone();
        let context = Self::new(Arc::new(store), config);
        match local_path {
            Some(path) => Ok(context.with_local_storage(Arc::new(FileStorage::open(path)?))),
            None => Ok(context),
        }
    }

    /// Replace local storage. The balance cache moves with it.
    #[must_use]
    pub fn with_local_storage(mut self, local: Arc<dyn KeyValueStorage>) -> Self {
        self.balance = BalanceLoader::new(
            Arc::clone(&self.store),
            Arc::clone(&local),
            self.config.balance_cache_ttl(),
        );
        self.local = local;
        self
    }

    /// Replace session storage.
    #[must_use]
    pub fn with_session_storage(mut self, session: Arc<dyn KeyValueStorage>) -> Self {
        self.session = session;
        self
    }

    /// Replace the retry policy for message writes.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The store handle.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Local storage.
    #[must_use]
    pub fn local_storage(&self) -> &dyn KeyValueStorage {
        self.local.as_ref()
    }

    /// Session storage.
    #[must_use]
    pub fn session_storage(&self) -> &dyn KeyValueStorage {
        self.session.as_ref()
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Retry policy for message writes.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The balance loader.
    #[must_use]
    pub const fn balance_loader(&self) -> &BalanceLoader {
        &self.balance
    }

    /// Admin console operations.
    #[must_use]
    pub const fn admin(&self) -> AdminConsole<'_> {
        AdminConsole::new(self)
    }

    /// Load the signed-in user's balance into `view`.
    ///
    /// Returns `None` when nobody is signed in.
    pub async fn quick_setup(&self, view: &dyn BalanceView) -> Option<Money> {
        let user = self.current_user()?;
        Some(self.balance.load(&user.uid, view).await)
    }
}
